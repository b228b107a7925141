pub mod approval;
pub mod auth;
pub mod certificate;
pub mod notification;
pub mod per_diem;
