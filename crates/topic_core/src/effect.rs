#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartJob {
        job_id: crate::JobId,
        descriptor: crate::JobDescriptor,
    },
    CancelJob {
        job_id: crate::JobId,
    },
    PersistSettings(crate::Settings),
}
