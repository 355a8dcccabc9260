
use log::{debug, info};
use thiserror::Error;

use strava_client::{ClientTraits, StravaClient, StravaError};

mod activity;

pub use crate::activity::{parse_start_date, MoveType, NormalizedActivity, DISTANCE_UNIT};

/// Only activities after this instant are fetched unless told otherwise.
/// 2019-11-01T00:00:00Z, the start of Movember 2019.
pub const DEFAULT_SINCE: i64 = 1572566400;

/// Number of activities requested per page.
pub const PAGE_SIZE: u32 = 30;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Strava(#[from] StravaError),
    #[error("Unable to parse activity start_date '{value}': {source}")]
    StartDate {
        value: String,
        source: chrono::ParseError,
    },
}

/// Pages through the athlete's Strava activities and turns every one of
/// them into a [`NormalizedActivity`].
///
/// The whole history is collected before returning, so callers see either
/// every activity after `since` or an error, never a partial list.
pub struct ActivityFetcher<C: ClientTraits = StravaClient> {
    client: C,
    per_page: u32,
}

impl ActivityFetcher<StravaClient> {
    /// Fetcher talking to the real Strava API.
    pub fn strava() -> Result<ActivityFetcher<StravaClient>, DownloadError> {
        Ok(ActivityFetcher::new(StravaClient::new()?))
    }
}

impl<C: ClientTraits> ActivityFetcher<C> {
    pub fn new(client: C) -> ActivityFetcher<C> {
        ActivityFetcher {
            client,
            per_page: PAGE_SIZE,
        }
    }

    /// Fetches every activity started after `since` (or [`DEFAULT_SINCE`]),
    /// keeping Strava's ordering within and across pages. Stops at the
    /// first empty page. Any request or parse failure fails the whole fetch.
    pub fn fetch_activities(
        &self,
        auth_token: &str,
        since: Option<i64>,
    ) -> Result<Vec<NormalizedActivity>, DownloadError> {
        let after = since.unwrap_or(DEFAULT_SINCE);
        let mut activities: Vec<NormalizedActivity> = Vec::new();
        let mut page: u32 = 1;

        loop {
            let batch = self
                .client
                .list_activities(auth_token, page, self.per_page, after)?;
            if batch.is_empty() {
                debug!("Page {} is empty, stopping", page);
                break;
            }
            for item in &batch {
                debug!(
                    "Normalizing activity {:?} '{}' ({})",
                    item.id,
                    item.name.as_deref().unwrap_or_default(),
                    item.activity_type
                );
                activities.push(NormalizedActivity::from_strava(item)?);
            }
            page += 1;
        }

        info!("Fetched {} activities after {}", activities.len(), after);
        Ok(activities)
    }
}

#[cfg(test)]
mod tests {

    use std::cell::RefCell;

    use strava_client::StravaActivity;

    use super::*;

    /// Serves scripted pages and records every request it sees.
    struct ScriptedPages {
        pages: Vec<Vec<StravaActivity>>,
        requests: RefCell<Vec<(String, u32, u32, i64)>>,
    }

    impl ScriptedPages {
        fn new(pages: Vec<Vec<StravaActivity>>) -> ScriptedPages {
            ScriptedPages {
                pages,
                requests: RefCell::new(vec![]),
            }
        }
    }

    impl ClientTraits for ScriptedPages {
        fn list_activities(
            &self,
            auth_token: &str,
            page: u32,
            per_page: u32,
            after: i64,
        ) -> Result<Vec<StravaActivity>, StravaError> {
            self.requests
                .borrow_mut()
                .push((String::from(auth_token), page, per_page, after));
            Ok(self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn activity(n: u64, activity_type: &str) -> StravaActivity {
        StravaActivity {
            id: Some(n),
            name: Some(format!("activity {}", n)),
            distance: n as f64,
            moving_time: 60 * n,
            start_date: String::from("2020-01-01T00:00:00Z"),
            activity_type: String::from(activity_type),
        }
    }

    fn page(range: std::ops::Range<u64>) -> Vec<StravaActivity> {
        range.map(|n| activity(n, if n % 2 == 0 { "Walk" } else { "Run" })).collect()
    }

    #[test]
    fn collects_pages_until_the_first_empty_one() {
        let fetcher = ActivityFetcher::new(ScriptedPages::new(vec![page(0..30), page(30..35), vec![]]));
        let activities = fetcher.fetch_activities("tok", None).unwrap();

        assert_eq!(activities.len(), 35);
        let durations: Vec<u64> = activities.iter().map(|a| a.duration).collect();
        let expected: Vec<u64> = (0..35).map(|n| 60 * n).collect();
        assert_eq!(durations, expected);

        let requests = fetcher.client.requests.borrow();
        let pages: Vec<u32> = requests.iter().map(|r| r.1).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert!(requests.iter().all(|r| r.0 == "tok" && r.2 == PAGE_SIZE && r.3 == DEFAULT_SINCE));
    }

    #[test]
    fn empty_first_page_yields_nothing() {
        let fetcher = ActivityFetcher::new(ScriptedPages::new(vec![]));
        assert!(fetcher.fetch_activities("tok", None).unwrap().is_empty());
        assert_eq!(fetcher.client.requests.borrow().len(), 1);
    }

    #[test]
    fn explicit_since_is_sent_as_after() {
        let fetcher = ActivityFetcher::new(ScriptedPages::new(vec![page(0..2)]));
        fetcher.fetch_activities("tok", Some(1600000000)).unwrap();
        assert!(fetcher.client.requests.borrow().iter().all(|r| r.3 == 1600000000));
    }

    #[test]
    fn repeated_fetches_do_not_share_results() {
        let fetcher = ActivityFetcher::new(ScriptedPages::new(vec![page(0..3)]));
        assert_eq!(fetcher.fetch_activities("tok", None).unwrap().len(), 3);
        assert_eq!(fetcher.fetch_activities("tok", None).unwrap().len(), 3);
    }

    #[test]
    fn walk_and_other_types_are_bucketed() {
        let fetcher = ActivityFetcher::new(ScriptedPages::new(vec![vec![
            activity(1, "Walk"),
            activity(2, "Ride"),
            activity(3, "Run"),
        ]]));
        let types: Vec<u8> = fetcher
            .fetch_activities("tok", None)
            .unwrap()
            .iter()
            .map(|a| a.move_type.id())
            .collect();
        assert_eq!(types, vec![1, 2, 2]);
    }

    #[test]
    fn one_bad_date_fails_the_whole_fetch() {
        let mut broken = page(30..32);
        broken[1].start_date = String::from("not a date");
        let fetcher = ActivityFetcher::new(ScriptedPages::new(vec![page(0..30), broken]));

        let err = fetcher.fetch_activities("tok", None).unwrap_err();
        assert!(matches!(err, DownloadError::StartDate { ref value, .. } if value == "not a date"));
        // no further pages are requested after the failure
        assert_eq!(fetcher.client.requests.borrow().len(), 2);
    }

    #[test]
    fn client_errors_are_propagated() {
        struct Rejecting;
        impl ClientTraits for Rejecting {
            fn list_activities(&self, _: &str, _: u32, _: u32, _: i64) -> Result<Vec<StravaActivity>, StravaError> {
                Err(StravaError::InvalidToken)
            }
        }
        let fetcher = ActivityFetcher::new(Rejecting);
        assert!(matches!(
            fetcher.fetch_activities("tok", None),
            Err(DownloadError::Strava(StravaError::InvalidToken))
        ));
    }
}
