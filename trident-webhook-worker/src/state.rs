use std::sync::Arc;

use trident_worker::InProcessWorkerClient;

#[derive(Clone)]
pub struct WorkerState {
    pub worker: Arc<InProcessWorkerClient>,
    pub access_token: Arc<str>,
}
