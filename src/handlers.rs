pub mod approvals;
pub mod certificates;
pub mod notifications;
pub mod per_diem;
