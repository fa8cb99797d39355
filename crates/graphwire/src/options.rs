//! Per-session and per-transaction options.

use serde::{Deserialize, Serialize};

use graphwire_rpc::proto;

/// Options sent with session and transaction opens and with queries.
///
/// Unset fields are left to the server's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub infer: Option<bool>,
    pub trace_inference: Option<bool>,
    pub explain: Option<bool>,
    pub parallel: Option<bool>,
    pub prefetch_size: Option<i32>,
    pub prefetch: Option<bool>,
    pub session_idle_timeout_millis: Option<i32>,
    pub transaction_timeout_millis: Option<i32>,
    pub schema_lock_acquire_timeout_millis: Option<i32>,
    /// Let data sessions open on any replica instead of the primary.
    pub read_any_replica: Option<bool>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infer(mut self, infer: bool) -> Self {
        self.infer = Some(infer);
        self
    }

    pub fn explain(mut self, explain: bool) -> Self {
        self.explain = Some(explain);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    pub fn prefetch_size(mut self, size: i32) -> Self {
        self.prefetch_size = Some(size);
        self
    }

    pub fn session_idle_timeout_millis(mut self, millis: i32) -> Self {
        self.session_idle_timeout_millis = Some(millis);
        self
    }

    pub fn transaction_timeout_millis(mut self, millis: i32) -> Self {
        self.transaction_timeout_millis = Some(millis);
        self
    }

    pub fn read_any_replica(mut self, read_any_replica: bool) -> Self {
        self.read_any_replica = Some(read_any_replica);
        self
    }

    pub fn to_proto(&self) -> proto::Options {
        proto::Options {
            infer: self.infer,
            trace_inference: self.trace_inference,
            explain: self.explain,
            parallel: self.parallel,
            prefetch_size: self.prefetch_size,
            prefetch: self.prefetch,
            session_idle_timeout_millis: self.session_idle_timeout_millis,
            transaction_timeout_millis: self.transaction_timeout_millis,
            schema_lock_acquire_timeout_millis: self.schema_lock_acquire_timeout_millis,
            read_any_replica: self.read_any_replica,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_only_named_fields() {
        let options = Options::new().infer(true).prefetch_size(50);
        let wire = options.to_proto();
        assert_eq!(wire.infer, Some(true));
        assert_eq!(wire.prefetch_size, Some(50));
        assert_eq!(wire.explain, None);
    }

    #[test]
    fn options_deserialize_from_toml() {
        let options: Options = toml::from_str(
            r#"
            infer = true
            transaction_timeout_millis = 30000
            "#,
        )
        .unwrap();
        assert_eq!(options.infer, Some(true));
        assert_eq!(options.transaction_timeout_millis, Some(30_000));
        assert_eq!(options.read_any_replica, None);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let result: Result<Options, _> = toml::from_str("inference = true");
        assert!(result.is_err());
    }
}
