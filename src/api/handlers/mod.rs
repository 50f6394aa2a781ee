pub mod employees;
pub mod modules;
pub mod profile;
pub mod system;

pub use employees::*;
pub use modules::*;
pub use profile::*;
pub use system::*;

use crate::core::storage::AvatarStore;
use crate::db::repository::{
    EmployeeRepository, GenericUserRepository, HrUserRepository, ModuleRepository,
};
use crate::mailer::Mailer;
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub hr_repo: Arc<HrUserRepository>,
    pub employee_repo: Arc<EmployeeRepository>,
    pub module_repo: Arc<ModuleRepository>,
    pub user_repo: Arc<GenericUserRepository>,
    pub mailer: Arc<Mailer>,
    pub avatars: Arc<AvatarStore>,
    pub jwt_secret: Arc<String>,
}
