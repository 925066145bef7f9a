pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod lending_service;
pub mod lending_service_impl;
pub use lending_service::{
    CatalogStats, Dashboard, LendingError, LendingReceipt, LendingService,
};
pub use lending_service_impl::SeaOrmLendingService;

pub mod token;
pub use token::{Claims, TokenIssuer};
