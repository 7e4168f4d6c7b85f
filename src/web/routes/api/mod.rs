pub mod dashboard;
pub mod subscribe;

pub use dashboard::dashboard;
pub use subscribe::subscribe;
