//! In-memory fakes for the submission protocol tests.
//!
//! `MemoryTaskStore` mirrors the durable store's contract (tagged
//! rate-limit outcome, rows-matched update semantics) and exposes
//! failure knobs so tests can force each compensation path.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use pictor_core::catalog::{ModelCatalog, ModelSpec, ParseError};
use pictor_core::types::{ModelId, Platform, TaskType, UserId};
use pictor_db::models::generation_task::{FallbackRewrite, GenerationTask, PlaceholderTask};
use pictor_db::models::status::{GenerationStatus, StatusId, IN_FLIGHT_STATUSES};
use pictor_db::store::{CreateOutcome, CreditLedger, LedgerError, StoreError, TaskStore};
use pictor_orchestrator::Orchestrator;
use pictor_providers::{AdapterError, ProviderAdapter, ProviderRegistry};

pub const CALLBACK_URL: &str = "http://callback.test/api/v1/generation/webhook";

// ---------------------------------------------------------------------------
// Task store fake
// ---------------------------------------------------------------------------

/// Behaviour of the category quota check.
pub enum QuotaBehavior {
    Allow,
    Deny,
    Unavailable,
}

pub struct MemoryTaskStore {
    rows: Mutex<Vec<GenerationTask>>,
    next_id: AtomicI64,
    /// Number of upcoming creates to refuse as rate-limited.
    rate_limit_remaining: AtomicU32,
    /// Number of upcoming updates to answer with zero rows matched.
    update_failures_remaining: AtomicU32,
    quota: Mutex<QuotaBehavior>,
}

impl MemoryTaskStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            rate_limit_remaining: AtomicU32::new(0),
            update_failures_remaining: AtomicU32::new(0),
            quota: Mutex::new(QuotaBehavior::Allow),
        })
    }

    pub fn rate_limit_next(&self, count: u32) {
        self.rate_limit_remaining.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_updates(&self, count: u32) {
        self.update_failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn set_quota(&self, behavior: QuotaBehavior) {
        *self.quota.lock().unwrap() = behavior;
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn find(&self, task_id: &str) -> Option<GenerationTask> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.task_id == task_id)
            .cloned()
    }

    /// Seed a pre-existing row (e.g. an in-flight task or a fallback
    /// candidate).
    pub fn seed_row(&self, task_id: &str, user_id: UserId, cost: f64, status: GenerationStatus) {
        let row = self.build_row(
            task_id,
            user_id,
            5,
            "test/video-model",
            "fal",
            "video",
            cost,
            json!({"prompt": "seeded"}),
            status.id(),
        );
        self.rows.lock().unwrap().push(row);
    }

    #[allow(clippy::too_many_arguments)]
    fn build_row(
        &self,
        task_id: &str,
        user_id: UserId,
        model_id: ModelId,
        model_name: &str,
        platform: &str,
        task_type: &str,
        cost: f64,
        payload: Value,
        status_id: StatusId,
    ) -> GenerationTask {
        let now = chrono::Utc::now();
        GenerationTask {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            task_id: task_id.to_owned(),
            previous_task_id: None,
            user_id,
            model_id,
            model_name: model_name.to_owned(),
            platform: platform.to_owned(),
            task_type: task_type.to_owned(),
            cost,
            payload,
            tool: None,
            status_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Consume one unit from a countdown knob; true while armed.
    fn consume(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create_placeholder(
        &self,
        fields: &PlaceholderTask,
    ) -> Result<CreateOutcome, StoreError> {
        if Self::consume(&self.rate_limit_remaining) {
            return Ok(CreateOutcome::RateLimited);
        }
        let row = self.build_row(
            &fields.task_id,
            fields.user_id,
            fields.model_id,
            &fields.model_name,
            &fields.platform,
            &fields.task_type,
            fields.cost,
            fields.payload.clone(),
            GenerationStatus::Pending.id(),
        );
        self.rows.lock().unwrap().push(row.clone());
        Ok(CreateOutcome::Created(row))
    }

    async fn update_task_id(
        &self,
        old_task_id: &str,
        new_task_id: &str,
    ) -> Result<u64, StoreError> {
        if Self::consume(&self.update_failures_remaining) {
            return Ok(0);
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.task_id == old_task_id) {
            Some(row) => {
                row.task_id = new_task_id.to_owned();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_task_id(&self, task_id: &str) -> Result<(), StoreError> {
        self.rows.lock().unwrap().retain(|r| r.task_id != task_id);
        Ok(())
    }

    async fn in_flight_costs(&self, user_id: UserId) -> Result<Vec<f64>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && IN_FLIGHT_STATUSES.contains(&r.status_id))
            .map(|r| r.cost)
            .collect())
    }

    async fn category_quota_allows(
        &self,
        _user_id: UserId,
        _task_type: &str,
    ) -> Result<bool, StoreError> {
        match *self.quota.lock().unwrap() {
            QuotaBehavior::Allow => Ok(true),
            QuotaBehavior::Deny => Ok(false),
            QuotaBehavior::Unavailable => {
                Err(StoreError::Unavailable("quota service unreachable".into()))
            }
        }
    }

    async fn apply_fallback(
        &self,
        original_task_id: &str,
        rewrite: &FallbackRewrite,
    ) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.task_id == original_task_id) {
            Some(row) => {
                row.previous_task_id = Some(row.task_id.clone());
                row.task_id = rewrite.task_id.clone();
                row.model_id = rewrite.model_id;
                row.model_name = rewrite.model_name.clone();
                row.platform = rewrite.platform.clone();
                row.payload = rewrite.payload.clone();
                row.status_id = GenerationStatus::Pending.id();
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Credit ledger fake
// ---------------------------------------------------------------------------

pub struct MemoryLedger {
    balance: f64,
    unavailable: bool,
}

impl MemoryLedger {
    pub fn with_balance(balance: f64) -> Arc<Self> {
        Arc::new(Self {
            balance,
            unavailable: false,
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            balance: 0.0,
            unavailable: true,
        })
    }
}

#[async_trait]
impl CreditLedger for MemoryLedger {
    async fn can_consume(&self, _user_id: UserId, amount: f64) -> Result<bool, LedgerError> {
        if self.unavailable {
            return Err(LedgerError::Unavailable("ledger unreachable".into()));
        }
        Ok(self.balance >= amount)
    }
}

// ---------------------------------------------------------------------------
// Provider adapter fake
// ---------------------------------------------------------------------------

/// One scripted `submit` outcome.
pub enum Scripted {
    Succeed(&'static str),
    Fail,
}

pub struct FakeAdapter {
    platform: Platform,
    script: Mutex<VecDeque<Scripted>>,
    cancelled: Mutex<Vec<String>>,
    cancellable: bool,
}

impl FakeAdapter {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            script: Mutex::new(VecDeque::new()),
            cancelled: Mutex::new(Vec::new()),
            cancellable: false,
        }
    }

    pub fn cancellable(mut self) -> Self {
        self.cancellable = true;
        self
    }

    pub fn scripted(self, results: impl IntoIterator<Item = Scripted>) -> Self {
        self.script.lock().unwrap().extend(results);
        self
    }

    pub fn cancelled_ids(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn submit(
        &self,
        _job_name: &str,
        _input: &Value,
        _callback_url: &str,
    ) -> Result<String, AdapterError> {
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Succeed(id)) => Ok(id.to_owned()),
            Some(Scripted::Fail) => Err(AdapterError::Rejected("scripted failure".into())),
            None => panic!("unscripted submit call"),
        }
    }

    fn supports_cancel(&self) -> bool {
        self.cancellable
    }

    async fn cancel(&self, task_id: &str) {
        if self.cancellable {
            self.cancelled.lock().unwrap().push(task_id.to_owned());
        }
    }
}

// ---------------------------------------------------------------------------
// Test catalog
// ---------------------------------------------------------------------------

pub const TEST_MODEL: ModelId = 900;
pub const TEST_IMAGE_MODEL: ModelId = 901;
pub const TEST_UPGRADING_MODEL: ModelId = 902;
pub const TEST_REJECTING_MODEL: ModelId = 903;

fn cost_ten(_: &Value) -> f64 {
    10.0
}

fn parse_passthrough(params: &Value) -> Result<Value, ParseError> {
    Ok(params.clone())
}

fn parse_reject(_: &Value) -> Result<Value, ParseError> {
    Err(ParseError::new("prompt is required"))
}

fn upgrade_on_images(input: &Value) -> Option<ModelId> {
    input["images"]
        .as_array()
        .filter(|a| !a.is_empty())
        .map(|_| TEST_IMAGE_MODEL)
}

pub fn test_catalog() -> ModelCatalog {
    ModelCatalog::from_specs([
        (
            TEST_MODEL,
            ModelSpec {
                name: "test/video-model",
                platform: Platform::Fal,
                task_type: TaskType::Video,
                cost: cost_ten,
                parse: parse_passthrough,
                upgrade_by_input: None,
            },
        ),
        (
            TEST_IMAGE_MODEL,
            ModelSpec {
                name: "test/image-model",
                platform: Platform::Fal,
                task_type: TaskType::Image,
                cost: cost_ten,
                parse: parse_passthrough,
                upgrade_by_input: None,
            },
        ),
        (
            TEST_UPGRADING_MODEL,
            ModelSpec {
                name: "test/upgrading-model",
                platform: Platform::Fal,
                task_type: TaskType::Image,
                cost: cost_ten,
                parse: parse_passthrough,
                upgrade_by_input: Some(upgrade_on_images),
            },
        ),
        (
            TEST_REJECTING_MODEL,
            ModelSpec {
                name: "test/rejecting-model",
                platform: Platform::Fal,
                task_type: TaskType::Image,
                cost: cost_ten,
                parse: parse_reject,
                upgrade_by_input: None,
            },
        ),
    ])
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryTaskStore>,
    pub adapter: Arc<FakeAdapter>,
    pub orchestrator: Orchestrator,
}

/// Wire an orchestrator around the fakes with the standard test
/// catalog.
pub fn harness(balance: f64, adapter: FakeAdapter) -> Harness {
    let store = MemoryTaskStore::new();
    let adapter = Arc::new(adapter);
    let registry = ProviderRegistry::new().register(adapter.clone());
    let orchestrator = Orchestrator::new(
        Arc::new(test_catalog()),
        Arc::new(registry),
        store.clone(),
        MemoryLedger::with_balance(balance),
        CALLBACK_URL.to_owned(),
    );
    Harness {
        store,
        adapter,
        orchestrator,
    }
}

pub fn user() -> UserId {
    uuid::Uuid::new_v4()
}
