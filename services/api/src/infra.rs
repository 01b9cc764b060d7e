use metrics_exporter_prometheus::PrometheusHandle;
use scholar_review::config::ReviewConfig;
use scholar_review::error::AppError;
use scholar_review::workflows::scholar::{
    apply_application_updates, ApplicationId, ApplicationPatch, ApplicationStore,
    ApplicationUpdate, ExaminationId, ExaminationPatch, ExaminationRecord, ExaminationStore,
    FacultyDirectory, RecordFilter, ScholarApplication, ScholarReviewService, StoreError,
};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

pub(crate) type InMemoryReviewService =
    ScholarReviewService<InMemoryApplicationStore, InMemoryExaminationStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationStore {
    records: Arc<Mutex<BTreeMap<ApplicationId, ScholarApplication>>>,
}

impl ApplicationStore for InMemoryApplicationStore {
    fn fetch_all(
        &self,
        filter: RecordFilter<'_, ScholarApplication>,
    ) -> Result<Vec<ScholarApplication>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.map(|keep| keep(*record)).unwrap_or(true))
            .cloned()
            .collect())
    }

    fn update_by_id(&self, id: &ApplicationId, patch: &ApplicationPatch) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        apply_application_updates(&mut guard, &[(id.clone(), patch.clone())])
    }

    fn update_batch(&self, updates: &[ApplicationUpdate]) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        apply_application_updates(&mut guard, updates)
    }

    fn insert(&self, record: ScholarApplication) -> Result<ApplicationId, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        let id = record.id.clone();
        guard.insert(id.clone(), record);
        Ok(id)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryExaminationStore {
    records: Arc<Mutex<BTreeMap<ExaminationId, ExaminationRecord>>>,
}

impl ExaminationStore for InMemoryExaminationStore {
    fn fetch_all(
        &self,
        filter: RecordFilter<'_, ExaminationRecord>,
    ) -> Result<Vec<ExaminationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.map(|keep| keep(*record)).unwrap_or(true))
            .cloned()
            .collect())
    }

    fn update_by_id(
        &self,
        id: &ExaminationId,
        patch: &ExaminationPatch,
    ) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        patch.apply(record);
        Ok(())
    }

    fn update_batch(
        &self,
        ids: &[ExaminationId],
        patch: &ExaminationPatch,
    ) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if ids.iter().any(|id| !guard.contains_key(id)) {
            return Err(StoreError::NotFound);
        }
        for id in ids {
            if let Some(record) = guard.get_mut(id) {
                patch.apply(record);
            }
        }
        Ok(())
    }

    fn insert(&self, record: ExaminationRecord) -> Result<ExaminationId, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict);
        }
        let id = record.id.clone();
        guard.insert(id.clone(), record);
        Ok(id)
    }
}

pub(crate) fn load_directory(config: &ReviewConfig) -> Result<FacultyDirectory, AppError> {
    match &config.directory_path {
        Some(path) => {
            let directory = FacultyDirectory::from_path(path)?;
            info!(
                path = %path.display(),
                faculties = directory.faculties.len(),
                "faculty directory loaded"
            );
            Ok(directory)
        }
        None => Ok(FacultyDirectory::standard()),
    }
}

pub(crate) fn in_memory_service(config: &ReviewConfig) -> Result<InMemoryReviewService, AppError> {
    let directory = load_directory(config)?;
    Ok(ScholarReviewService::new(
        Arc::new(InMemoryApplicationStore::default()),
        Arc::new(InMemoryExaminationStore::default()),
        directory,
    )
    .with_ranking(config.ranking()))
}
