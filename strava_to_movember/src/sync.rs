//! The sync pipeline: log into Movember, pull every Strava activity,
//! then post them one by one in the order Strava returned them.

use log::{debug, info};
use serde_json::Value;

use movember_upload::{MovePublisher, MovemberSession};
use strava_client::ClientTraits;
use strava_download::{ActivityFetcher, NormalizedActivity};

use crate::error::SyncError;
use crate::profile::{Credentials, ProfileConfig};
use crate::secrets::SecretStore;

/// Produces the complete list of activities to publish.
pub trait ActivitySource {
    fn fetch_activities(
        &self,
        auth_token: &str,
        since: Option<i64>,
    ) -> Result<Vec<NormalizedActivity>, SyncError>;
}

/// Accepts moves for a logged in Movember member.
pub trait MoveSink {
    fn authenticate(&self, email: &str, password: &str) -> Result<MovemberSession, SyncError>;
    fn publish(
        &self,
        session: &MovemberSession,
        activity: &NormalizedActivity,
    ) -> Result<Value, SyncError>;
}

impl<C: ClientTraits> ActivitySource for ActivityFetcher<C> {
    fn fetch_activities(
        &self,
        auth_token: &str,
        since: Option<i64>,
    ) -> Result<Vec<NormalizedActivity>, SyncError> {
        Ok(ActivityFetcher::fetch_activities(self, auth_token, since)?)
    }
}

impl MoveSink for MovePublisher {
    fn authenticate(&self, email: &str, password: &str) -> Result<MovemberSession, SyncError> {
        Ok(MovePublisher::authenticate(self, email, password)?)
    }

    fn publish(
        &self,
        session: &MovemberSession,
        activity: &NormalizedActivity,
    ) -> Result<Value, SyncError> {
        Ok(MovePublisher::publish(self, session, activity)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub published: usize,
}

/// Runs one sync for already resolved credentials. Stops at the first
/// error; moves posted before it stay posted.
pub fn run_sync<S, K>(
    source: &S,
    sink: &K,
    credentials: &Credentials,
    strava_token: &str,
    since: Option<i64>,
) -> Result<SyncReport, SyncError>
where
    S: ActivitySource + ?Sized,
    K: MoveSink + ?Sized,
{
    let session = sink.authenticate(&credentials.email, &credentials.password)?;
    let activities = source.fetch_activities(strava_token, since)?;
    info!(
        "Publishing {} activities for profile '{}'",
        activities.len(),
        credentials.profile
    );

    let mut report = SyncReport {
        fetched: activities.len(),
        published: 0,
    };
    for activity in &activities {
        let confirmation = sink.publish(&session, activity)?;
        report.published += 1;
        debug!(
            "Published move {}/{}: {}",
            report.published, report.fetched, confirmation
        );
    }
    Ok(report)
}

/// Resolves `profile` against the config and secret store, then syncs.
/// Nothing is sent over the network unless the profile is complete.
pub fn sync_profile<S, K>(
    profiles: &ProfileConfig,
    profile: Option<&str>,
    store: &dyn SecretStore,
    source: &S,
    sink: &K,
    strava_token: &str,
    since: Option<i64>,
) -> Result<SyncReport, SyncError>
where
    S: ActivitySource + ?Sized,
    K: MoveSink + ?Sized,
{
    let credentials = profiles.resolve(profile, store)?;
    run_sync(source, sink, &credentials, strava_token, since)
}

#[cfg(test)]
mod tests {

    use std::cell::RefCell;

    use serde_json::json;
    use strava_download::{MoveType, DISTANCE_UNIT};

    use super::*;
    use crate::error::ConfigurationError;
    use crate::profile::Profile;
    use crate::secrets::{MemorySecretStore, PASSWORD_KEY};

    #[derive(Default)]
    struct Calls {
        log: RefCell<Vec<String>>,
    }

    struct FakeStrava<'a> {
        calls: &'a Calls,
        activities: Vec<NormalizedActivity>,
    }

    impl ActivitySource for FakeStrava<'_> {
        fn fetch_activities(
            &self,
            auth_token: &str,
            since: Option<i64>,
        ) -> Result<Vec<NormalizedActivity>, SyncError> {
            self.calls
                .log
                .borrow_mut()
                .push(format!("fetch {} {:?}", auth_token, since));
            Ok(self.activities.clone())
        }
    }

    struct FakeMovember<'a> {
        calls: &'a Calls,
        fail_on: Option<usize>,
        published: RefCell<Vec<NormalizedActivity>>,
    }

    impl<'a> FakeMovember<'a> {
        fn new(calls: &'a Calls) -> FakeMovember<'a> {
            FakeMovember {
                calls,
                fail_on: None,
                published: RefCell::new(vec![]),
            }
        }
    }

    impl MoveSink for FakeMovember<'_> {
        fn authenticate(&self, email: &str, _password: &str) -> Result<MovemberSession, SyncError> {
            self.calls.log.borrow_mut().push(format!("auth {}", email));
            Ok(MovemberSession {
                access_token: String::from("t"),
                member_id: String::from("1"),
            })
        }

        fn publish(
            &self,
            _session: &MovemberSession,
            activity: &NormalizedActivity,
        ) -> Result<Value, SyncError> {
            self.calls.log.borrow_mut().push(String::from("publish"));
            if self.fail_on == Some(self.published.borrow().len()) {
                return Err(SyncError::Transport(String::from("HTTP 502")));
            }
            self.published.borrow_mut().push(activity.clone());
            Ok(json!({"ok": true}))
        }
    }

    fn activities(count: u64) -> Vec<NormalizedActivity> {
        (0..count)
            .map(|n| NormalizedActivity {
                distance: n as f64,
                distance_unit: DISTANCE_UNIT,
                duration: n,
                start_date: 1577836800 + n as i64,
                move_type: MoveType::Other,
            })
            .collect()
    }

    fn credentials() -> Credentials {
        Credentials {
            profile: String::from("default"),
            email: String::from("mo@example.com"),
            password: String::from("pw"),
        }
    }

    #[test]
    fn publishes_every_activity_in_fetch_order() {
        let calls = Calls::default();
        let strava = FakeStrava {
            calls: &calls,
            activities: activities(35),
        };
        let movember = FakeMovember::new(&calls);

        let report = run_sync(&strava, &movember, &credentials(), "tok", None).unwrap();

        assert_eq!(report, SyncReport { fetched: 35, published: 35 });
        assert_eq!(*movember.published.borrow(), activities(35));
        let log = calls.log.borrow();
        assert_eq!(log[0], "auth mo@example.com");
        assert_eq!(log[1], "fetch tok None");
        assert_eq!(log.len(), 37);
    }

    #[test]
    fn first_publish_failure_aborts_the_run() {
        let calls = Calls::default();
        let strava = FakeStrava {
            calls: &calls,
            activities: activities(5),
        };
        let mut movember = FakeMovember::new(&calls);
        movember.fail_on = Some(2);

        let err = run_sync(&strava, &movember, &credentials(), "tok", Some(1)).unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
        // the two moves before the failure stay published
        assert_eq!(movember.published.borrow().len(), 2);
        assert_eq!(calls.log.borrow().iter().filter(|c| *c == "publish").count(), 3);
    }

    #[test]
    fn unknown_profile_makes_no_calls() {
        let calls = Calls::default();
        let strava = FakeStrava {
            calls: &calls,
            activities: activities(3),
        };
        let movember = FakeMovember::new(&calls);
        let store = MemorySecretStore::new();
        let profiles = ProfileConfig::default();

        let err = sync_profile(&profiles, Some("ghost"), &store, &strava, &movember, "tok", None)
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Configuration(ConfigurationError::ProfileNotFound(_))
        ));
        assert!(calls.log.borrow().is_empty());
    }

    #[test]
    fn complete_profile_is_synced() {
        let calls = Calls::default();
        let strava = FakeStrava {
            calls: &calls,
            activities: activities(2),
        };
        let movember = FakeMovember::new(&calls);
        let store = MemorySecretStore::new();
        store
            .set_secret("strava_to_movember_work", PASSWORD_KEY, "pw")
            .unwrap();
        let mut profiles = ProfileConfig::default();
        profiles.profiles.insert(
            String::from("work"),
            Profile {
                movember_email: Some(String::from("work@example.com")),
            },
        );

        let report =
            sync_profile(&profiles, Some("work"), &store, &strava, &movember, "tok", Some(42)).unwrap();
        assert_eq!(report.published, 2);
        assert_eq!(calls.log.borrow()[0], "auth work@example.com");
        assert_eq!(calls.log.borrow()[1], "fetch tok Some(42)");
    }
}
