pub mod mailjet;
pub mod receipts;
