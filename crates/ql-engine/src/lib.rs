//! QualityLens query engine.
//!
//! Turns free-text quality questions ("查询聚龙供应商的库存") into a
//! structured answer:
//!
//! text → [`extract`] (entity map) → [`matcher`] (best rule or none)
//!   → [`binder`] → [`executor`] → [`normalize`] → `QueryResponse`
//!
//! and routes anything no rule matches confidently to the conversational
//! [`fallback`].

pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod extract;
pub mod fallback;
pub mod matcher;
pub mod mock;
pub mod normalize;
pub mod rules;

pub use config::EngineConfig;
pub use engine::{QueryContext, QueryEngine, QueryOptions};
pub use error::{BindError, ChatError, EngineError, RuleError, StoreError, TemplateError};
pub use executor::{DataStore, PgDataStore, QueryExecutor};
pub use fallback::{ChatClient, ChatOptions, FallbackOrchestrator, HttpChatClient, RetryPolicy};
pub use matcher::{IntentMatcher, MatchOutcome, RuleMatch};
pub use mock::{MockChatClient, MockDataStore};
pub use rules::{PgRuleSource, RuleCatalog, RuleSource, RuleStore, StaticRuleSource, TomlRuleSource};
