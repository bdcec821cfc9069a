mod early_access;
mod health_check;
