mod dashboard;
mod health;
mod info;
mod proxy;
mod ws;

pub use dashboard::dashboard_handler;
pub use health::health_handler;
pub use info::info_handler;
pub use proxy::proxy_handler;
pub use ws::ws_handler;
