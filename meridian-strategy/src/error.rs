use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy init failed: {0}")]
    Init(String),

    /// A plug-in hook panicked; caught at the boundary so one plug-in's fault never takes down
    /// its siblings (§4.4: "each implementation is isolated so that an exception does not affect
    /// siblings").
    #[error("strategy plug-in panicked: {0}")]
    Panicked(String),

    /// §4.4: "the offending plug-in is quarantined after K consecutive faults within W".
    #[error("strategy quarantined after repeated faults")]
    Quarantined,
}
