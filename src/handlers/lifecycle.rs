use crate::domain::services::NetworkClient;
use crate::errors::AppError;
use crate::infrastructure::container::ServiceContainer;

/// 处理生命周期命令：解析客户端（触发 init），随后关闭容器（触发 destroy）
///
/// 返回客户端记录的全部事件。
pub fn handle_lifecycle(container: &ServiceContainer) -> Result<Vec<String>, AppError> {
    let client = container.resolve::<NetworkClient>()?;
    tracing::info!(url = client.url(), connected = client.is_connected(), "Network client resolved");

    container.shutdown()?;
    Ok(client.events())
}
