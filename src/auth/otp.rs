//! One-time code store.
//!
//! In-memory, keyed by phone number. A code is valid for five minutes
//! and is consumed on successful verification; requesting a new code
//! replaces any pending one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// How long a code stays valid.
const OTP_TTL_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct OtpStore {
    pending: Arc<Mutex<HashMap<String, PendingCode>>>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh 6-digit code for a phone number, replacing any
    /// pending one. Returns the code so the caller can hand it to the
    /// delivery channel (here: the log).
    pub fn issue(&self, phone_number: &str) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let pending = PendingCode {
            code: code.clone(),
            expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
        };
        self.pending
            .lock()
            .unwrap()
            .insert(phone_number.to_string(), pending);
        code
    }

    /// Check a code. Consumes it on success; expired codes are removed
    /// and fail the check.
    pub fn verify(&self, phone_number: &str, code: &str) -> bool {
        let mut pending = self.pending.lock().unwrap();
        let Some(entry) = pending.get(phone_number) else {
            return false;
        };
        if entry.expires_at < Utc::now() {
            pending.remove(phone_number);
            return false;
        }
        if entry.code != code {
            return false;
        }
        pending.remove(phone_number);
        true
    }
}
