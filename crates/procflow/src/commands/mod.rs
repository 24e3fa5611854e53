pub mod deploy;
pub mod env;
pub mod export;
pub mod inspect;
pub mod validate;
