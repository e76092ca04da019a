//! 网络客户端
//!
//! 演示 init / destroy 生命周期回调：创建后连接，容器关闭时断开。

use crate::domain::errors::DomainError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

pub struct NetworkClient {
    url: String,
    connected: AtomicBool,
    events: Mutex<Vec<String>>,
}

impl NetworkClient {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Self {
            url: url.into(),
            connected: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
        };
        client.record(format!("constructor, url = {}", client.url));
        client
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// 已发生的事件
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        self.record(format!("connect: {}", self.url));
    }

    pub fn call(&self, message: &str) -> Result<(), DomainError> {
        if !self.is_connected() {
            return Err(DomainError::NotConnected { url: self.url.clone() });
        }
        self.record(format!("call: {} message = {}", self.url, message));
        Ok(())
    }

    pub fn disconnect(&self) -> Result<(), DomainError> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Err(DomainError::NotConnected { url: self.url.clone() });
        }
        self.record(format!("close: {}", self.url));
        Ok(())
    }

    /// init 回调
    pub fn init(&self) -> Result<(), DomainError> {
        self.record("NetworkClient.init".to_string());
        self.connect();
        self.call("initial connection message")
    }

    /// destroy 回调
    pub fn close(&self) -> Result<(), DomainError> {
        self.record("NetworkClient.close".to_string());
        self.disconnect()
    }

    fn record(&self, event: String) {
        info!(target: "network_client", "{}", event);
        self.events.lock().push(event);
    }
}
