//! Job bookkeeping for one generation request.

/// One submitted job: still waiting on the service, or carrying its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSlot {
    Pending(String),
    Resolved(String),
}

/// Pending job ids and ready image payloads (base64 strings) of a provider.
///
/// Providers flip slots to [`JobSlot::Resolved`] while polling and call
/// [`GenerationSession::settle`] at the end of every pass, so between calls
/// `jobs` holds only pending entries.
#[derive(Debug, Default)]
pub struct GenerationSession {
    jobs: Vec<JobSlot>,
    ready_images: Vec<String>,
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, job_id: String) {
        self.jobs.push(JobSlot::Pending(job_id));
    }

    pub fn pending_ids(&self) -> Vec<&str> {
        self.jobs
            .iter()
            .filter_map(|slot| match slot {
                JobSlot::Pending(id) => Some(id.as_str()),
                JobSlot::Resolved(_) => None,
            })
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.jobs
            .iter()
            .any(|slot| matches!(slot, JobSlot::Pending(_)))
    }

    pub fn slots_mut(&mut self) -> std::slice::IterMut<'_, JobSlot> {
        self.jobs.iter_mut()
    }

    /// Move resolved payloads to the ready list, keeping order on both sides.
    pub fn settle(&mut self) {
        let (resolved, pending): (Vec<JobSlot>, Vec<JobSlot>) = self
            .jobs
            .drain(..)
            .partition(|slot| matches!(slot, JobSlot::Resolved(_)));

        self.ready_images
            .extend(resolved.into_iter().filter_map(|slot| match slot {
                JobSlot::Resolved(image) => Some(image),
                JobSlot::Pending(_) => None,
            }));
        self.jobs = pending;
    }

    pub fn ready_count(&self) -> usize {
        self.ready_images.len()
    }

    /// Returns every ready image and empties the list.
    pub fn take_ready(&mut self) -> Vec<String> {
        std::mem::take(&mut self.ready_images)
    }
}
