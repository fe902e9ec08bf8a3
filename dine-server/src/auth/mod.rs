//! 员工认证
//!
//! HS256 JWT 验证与中间件。令牌由外部身份系统签发，本服务只验证。

mod jwt;
mod middleware;

pub use jwt::{Claims, CurrentStaff, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_staff};
