pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod biometrics {
    pub mod codec;
    pub mod matcher;
}

pub mod eligibility {
    pub mod filter;
}

pub mod ledger {
    pub mod transactions;
}

pub mod dispensing {
    pub mod authorizer;
}

pub mod models {
    pub mod api;
    pub mod prescription;
    pub mod record;
    pub mod transaction;
    pub mod user;
}

pub mod stores {
    pub mod document;
    pub mod memory_store;
    pub mod remote_store;
    pub mod store;
}

pub mod wal {
    pub mod wal;
}

pub mod metrics {
    pub mod collector;
}

pub mod handlers {
    pub mod authorize;
    pub mod confirm;
    pub mod fallback;
    pub mod health;
    pub mod metrics;
}

pub mod utils {
    pub mod auth;
    pub mod time;
}
