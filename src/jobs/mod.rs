// 后台任务模块
// 即发即忘的模拟邮件任务

use std::time::Duration;

use uuid::Uuid;

/// 触发一次模拟邮件发送，立即返回任务ID，发送在后台完成
pub fn send_mock_email(email: String) -> String {
    let job_id = Uuid::new_v4().to_string();
    let id = job_id.clone();

    tokio::spawn(async move {
        tracing::info!(job_id = %id, email = %email, "开始发送邮件");
        tokio::time::sleep(Duration::from_secs(2)).await;
        tracing::info!(job_id = %id, email = %email, "邮件发送完成");
    });

    job_id
}
