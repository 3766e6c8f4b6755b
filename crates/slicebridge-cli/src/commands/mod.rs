pub mod inspect;
pub mod mount;
