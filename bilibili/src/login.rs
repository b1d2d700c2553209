use crate::{
    client::{Client, Envelope, PASSPORT_BASE},
    error::{Error, Result},
    qr,
    session::Credential,
};
use log::debug;
use reqwest::{StatusCode, header::SET_COOKIE};
use serde::Deserialize;
use std::{
    io::Write,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, SyncSender, sync_channel},
    },
    thread,
    time::Duration,
};

// Poll codes defined by the passport service.
const POLL_CONFIRMED: i64 = 0;
const POLL_EXPIRED: i64 = 86038;
const POLL_SCAN_PENDING: i64 = 86090;
const POLL_NOT_SCANNED: i64 = 86101;

/// The service tracks scan state at second granularity, polling faster
/// only draws rate limiting.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// One observed transition of a running login attempt.
///
/// `Confirmed`, `Expired` and `Failed` are terminal: the event channel
/// closes right after delivering one of them.
#[derive(Debug)]
pub enum LoginEvent {
    /// The qr code has not been scanned yet.
    AwaitingScan,
    /// Scanned, waiting for the in-app confirmation.
    ScanPending,
    /// Confirmed; carries the freshly issued credential. Persisting it is
    /// the caller's job.
    Confirmed(Credential),
    /// The challenge expired before it was confirmed.
    Expired,
    /// A poll failed, the attempt is abandoned.
    Failed(Error),
}

/// Cooperative stop flag for a login attempt. Clones observe the same
/// flag, so one half can be handed to the poll loop and the other kept.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Deserialize)]
struct Challenge {
    url: String,
    qrcode_key: String,
}

#[derive(Deserialize)]
struct PollData {
    code: i64,
}

struct PollOutcome {
    code: i64,
    credential: Credential,
}

impl Client {
    /// Starts a qr login attempt: requests a challenge from the passport
    /// service, renders its scan url to `qr_out` and spawns the poll loop.
    ///
    /// The returned channel is unbuffered and delivers every state
    /// transition; drain it until it closes. Flip `cancel` to abandon the
    /// attempt early, in which case the channel closes without a terminal
    /// event.
    pub fn login_with_qrcode<W: Write>(
        &self,
        qr_out: &mut W,
        cancel: CancelToken,
    ) -> Result<Receiver<LoginEvent>> {
        let challenge: Challenge = self.get_json(
            &format!("{PASSPORT_BASE}/x/passport-login/web/qrcode/generate"),
            false,
        )?;
        qr::render(&challenge.url, qr_out)?;

        let http = self.http().clone();
        let poll_url = format!(
            "{PASSPORT_BASE}/x/passport-login/web/qrcode/poll?qrcode_key={}",
            challenge.qrcode_key
        );
        let (tx, rx) = sync_channel(0);

        thread::spawn(move || {
            drive_poll_loop(|| poll_once(&http, &poll_url), &cancel, POLL_INTERVAL, tx);
        });

        Ok(rx)
    }
}

/// One poll round trip. Issued tokens arrive as `Set-Cookie` headers on
/// the confirming response, so they are harvested here rather than from
/// the json body.
fn poll_once(http: &reqwest::blocking::Client, url: &str) -> Result<PollOutcome> {
    debug!("GET {url}");

    let response = http.get(url).send()?;

    if response.status() != StatusCode::OK {
        return Err(Error::UnexpectedStatus(response.status()));
    }

    let credential = Credential::new(
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_owned))
            .collect(),
    );

    let body = response.text()?;
    let data = serde_json::from_str::<Envelope<PollData>>(&body)?.into_data()?;

    Ok(PollOutcome {
        code: data.code,
        credential,
    })
}

/// Core poll loop, driven by any poll source.
///
/// Sends one event per poll over the rendezvous channel, so an inattentive
/// receiver stalls the loop instead of piling up events, and returns after
/// the first terminal event, a closed receiver, or cancellation. Dropping
/// `events` on return is what closes the channel, exactly once.
fn drive_poll_loop<F>(
    mut poll: F,
    cancel: &CancelToken,
    interval: Duration,
    events: SyncSender<LoginEvent>,
) where
    F: FnMut() -> Result<PollOutcome>,
{
    loop {
        if cancel.is_cancelled() {
            return;
        }

        let event = match poll() {
            Ok(outcome) => match outcome.code {
                POLL_CONFIRMED => LoginEvent::Confirmed(outcome.credential),
                POLL_EXPIRED => LoginEvent::Expired,
                POLL_SCAN_PENDING => LoginEvent::ScanPending,
                POLL_NOT_SCANNED => LoginEvent::AwaitingScan,
                code => {
                    debug!("unrecognized poll code {code}, still waiting");
                    LoginEvent::AwaitingScan
                }
            },
            Err(e) => LoginEvent::Failed(e),
        };

        let terminal = matches!(
            event,
            LoginEvent::Confirmed(_) | LoginEvent::Expired | LoginEvent::Failed(_)
        );

        if events.send(event).is_err() || terminal {
            return;
        }

        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting(code: i64) -> Result<PollOutcome> {
        Ok(PollOutcome {
            code,
            credential: Credential::default(),
        })
    }

    fn run_scripted(script: Vec<Result<PollOutcome>>, cancel: CancelToken) -> Vec<LoginEvent> {
        let mut script = script.into_iter();
        let (tx, rx) = sync_channel(0);

        let handle = thread::spawn(move || {
            drive_poll_loop(
                || script.next().expect("poll loop ran past its script"),
                &cancel,
                Duration::ZERO,
                tx,
            );
        });

        // Collecting to end proves the channel closed.
        let events = rx.iter().collect();
        handle.join().unwrap();
        events
    }

    #[test]
    fn expiry_emits_each_transition_then_closes() {
        let events = run_scripted(
            vec![
                waiting(POLL_NOT_SCANNED),
                waiting(POLL_NOT_SCANNED),
                waiting(POLL_EXPIRED),
            ],
            CancelToken::new(),
        );

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], LoginEvent::AwaitingScan));
        assert!(matches!(events[1], LoginEvent::AwaitingScan));
        assert!(matches!(events[2], LoginEvent::Expired));
    }

    #[test]
    fn confirmation_carries_the_issued_credential() {
        let credential = Credential::new(vec![
            "SESSDATA=abc123; Path=/; Domain=.bilibili.com".into(),
            "bili_jct=deadbeef; Path=/".into(),
        ]);
        let events = run_scripted(
            vec![
                waiting(POLL_NOT_SCANNED),
                waiting(POLL_SCAN_PENDING),
                Ok(PollOutcome {
                    code: POLL_CONFIRMED,
                    credential: credential.clone(),
                }),
            ],
            CancelToken::new(),
        );

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], LoginEvent::AwaitingScan));
        assert!(matches!(events[1], LoginEvent::ScanPending));
        let got = match &events[2] {
            LoginEvent::Confirmed(got) => got,
            other => panic!("expected confirmation, got {other:?}"),
        };
        assert_eq!(got, &credential);
        assert!(!got.is_empty());

        // The issued credential survives a store round trip.
        let dir = tempfile::tempdir().unwrap();
        let store = crate::session::SessionStore::at(dir.path().join("cookie.txt"));
        store.persist(got).unwrap();
        assert_eq!(&store.load().unwrap(), got);
    }

    #[test]
    fn poll_failure_is_terminal() {
        let events = run_scripted(
            vec![
                waiting(POLL_SCAN_PENDING),
                Err(Error::status(-412, "request was rejected")),
            ],
            CancelToken::new(),
        );

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LoginEvent::ScanPending));
        assert!(matches!(events[1], LoginEvent::Failed(Error::Status { code: -412, .. })));
    }

    #[test]
    fn unrecognized_code_keeps_polling() {
        let events = run_scripted(
            vec![waiting(86666), waiting(POLL_EXPIRED)],
            CancelToken::new(),
        );

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LoginEvent::AwaitingScan));
        assert!(matches!(events[1], LoginEvent::Expired));
    }

    #[test]
    fn cancelled_attempt_closes_without_a_terminal_event() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let events = run_scripted(vec![], cancel);
        assert!(events.is_empty());
    }
}
