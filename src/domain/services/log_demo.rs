//! 请求日志
//!
//! `MyLogger` 以作用域生命周期注册，每个请求一个实例；
//! `LogDemoService` 是单例，通过调用方传入的 [`RequestLog`] 写日志。

use crate::domain::errors::DomainError;
use crate::domain::interfaces::RequestLog;
use parking_lot::Mutex;
use tracing::info;

pub struct MyLogger {
    uuid: String,
    request_url: Mutex<Option<String>>,
    lines: Mutex<Vec<String>>,
}

impl MyLogger {
    pub fn new() -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            request_url: Mutex::new(None),
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn request_url(&self) -> Option<String> {
        self.request_url.lock().clone()
    }

    /// 已写出的日志行
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// init 回调
    pub fn on_create(&self) {
        self.write("request scope bean create");
    }

    /// destroy 回调
    pub fn on_close(&self) {
        self.write("request scope bean close");
    }

    fn write(&self, message: &str) {
        let line = match self.request_url.lock().as_deref() {
            Some(url) => format!("[{}][{}] {}", self.uuid, url, message),
            None => format!("[{}] {}", self.uuid, message),
        };
        info!(target: "request_log", "{}", line);
        self.lines.lock().push(line);
    }
}

impl Default for MyLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLog for MyLogger {
    fn set_request_url(&self, request_url: &str) -> Result<(), DomainError> {
        *self.request_url.lock() = Some(request_url.to_string());
        Ok(())
    }

    fn log(&self, message: &str) -> Result<(), DomainError> {
        self.write(message);
        Ok(())
    }
}

#[derive(Default)]
pub struct LogDemoService;

impl LogDemoService {
    pub fn new() -> Self {
        Self
    }

    pub fn logic(&self, logger: &dyn RequestLog, id: &str) -> Result<(), DomainError> {
        logger.log(&format!("service id = {}", id))
    }
}
