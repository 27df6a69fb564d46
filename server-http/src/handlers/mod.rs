pub mod health;
pub mod users;

pub use health::{health_check, not_found};
pub use users::{
    change_password, create_user, delete_me, delete_user, get_me, get_user, update_me,
};
