//! 옵션 체인 수집 도메인 모델.

mod expiration;
mod option;
mod stock;

pub use expiration::*;
pub use option::*;
pub use stock::*;
