//! Background loading of daily dashboard data
//!
//! Each request runs on its own tokio task and reports back over a channel.
//! Requests are numbered; only the outcome of the latest request is handed to
//! the application, so a slow response for a previously selected day can
//! never replace the data of the day currently on screen.

use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::data::{ApiError, DailyConsumptionClient, DayView};

/// Capacity of the outcome channel
const CHANNEL_CAPACITY: usize = 32;

/// Result of one load request
#[derive(Debug)]
pub struct LoadOutcome {
    /// Number of the request that produced this outcome
    pub generation: u64,
    /// Day that was requested
    pub date: NaiveDate,
    pub result: Result<DayView, ApiError>,
}

/// Issues load requests and filters out superseded outcomes
pub struct Loader {
    client: Arc<DailyConsumptionClient>,
    sender: mpsc::Sender<LoadOutcome>,
    receiver: mpsc::Receiver<LoadOutcome>,
    /// Number of the most recent request
    generation: u64,
}

impl Loader {
    pub fn new(client: DailyConsumptionClient) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            client: Arc::new(client),
            sender,
            receiver,
            generation: 0,
        }
    }

    /// Number of the most recent request
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts loading `date`, superseding any request still in flight
    ///
    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, date: NaiveDate) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let client = Arc::clone(&self.client);
        let tx = self.sender.clone();

        debug!(generation, %date, "load requested");
        tokio::spawn(async move {
            let result = client.fetch_day(date).await;
            let _ = tx
                .send(LoadOutcome {
                    generation,
                    date,
                    result,
                })
                .await;
        });

        generation
    }

    /// Returns the outcome of the latest request if it has arrived
    ///
    /// Superseded outcomes found in the channel are discarded.
    pub fn try_recv(&mut self) -> Option<LoadOutcome> {
        while let Ok(outcome) = self.receiver.try_recv() {
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
        None
    }

    /// Waits for the outcome of the latest request
    pub async fn next(&mut self) -> Option<LoadOutcome> {
        while let Some(outcome) = self.receiver.recv().await {
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
        None
    }

    fn accept(&self, outcome: LoadOutcome) -> Option<LoadOutcome> {
        if outcome.generation == self.generation {
            Some(outcome)
        } else {
            debug!(
                generation = outcome.generation,
                current = self.generation,
                date = %outcome.date,
                "discarding superseded load"
            );
            None
        }
    }
}
