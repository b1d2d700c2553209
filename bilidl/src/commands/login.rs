use anyhow::{Result, bail};
use bilibili::{
    Client,
    login::{CancelToken, LoginEvent},
    session::{Credential, SessionStore},
};
use clap::Args;
use log::info;
use std::{io::stdout, sync::mpsc::Receiver};

/// Login through a qr code (session kept at $HOME/.bilibili_cookie.txt).
#[derive(Debug, Clone, Args)]
pub struct Login {}

impl Login {
    pub fn execute(self) -> Result<()> {
        let mut client = Client::new()?;
        let store = SessionStore::new()?;

        ensure_login(&mut client, &store)?;

        let nav = client.nav()?;
        info!("Logged in as {}", nav.uname);
        Ok(())
    }
}

/// Attaches the stored session when it still validates; otherwise runs the
/// interactive qr flow and persists the confirmed credential. Nothing is
/// persisted on an expired or failed attempt.
pub fn ensure_login(client: &mut Client, store: &SessionStore) -> Result<()> {
    if let Ok(credential) = store.load() {
        client.set_credential(credential);
        if client.is_authenticated() {
            return Ok(());
        }
    }

    info!("Please login");

    let events = client.login_with_qrcode(&mut stdout(), CancelToken::new())?;
    let credential = watch_login(events)?;

    store.persist(&credential)?;
    client.set_credential(credential);

    Ok(())
}

/// Drains login events until the attempt settles.
fn watch_login(events: Receiver<LoginEvent>) -> Result<Credential> {
    for event in events {
        match event {
            LoginEvent::Confirmed(credential) => return Ok(credential),
            LoginEvent::Expired => bail!("login qrcode expired"),
            LoginEvent::Failed(e) => return Err(e.into()),
            LoginEvent::AwaitingScan | LoginEvent::ScanPending => (),
        }
    }

    bail!("login cancelled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::sync_channel;
    use std::thread;

    fn feed(events: Vec<LoginEvent>) -> Receiver<LoginEvent> {
        let (tx, rx) = sync_channel(0);
        thread::spawn(move || {
            for event in events {
                if tx.send(event).is_err() {
                    return;
                }
            }
        });
        rx
    }

    #[test]
    fn confirmation_yields_the_credential() {
        let credential = Credential::new(vec!["SESSDATA=abc".into()]);
        let events = feed(vec![
            LoginEvent::AwaitingScan,
            LoginEvent::ScanPending,
            LoginEvent::Confirmed(credential.clone()),
        ]);

        assert_eq!(watch_login(events).unwrap(), credential);
    }

    #[test]
    fn expiry_is_an_error() {
        let events = feed(vec![LoginEvent::AwaitingScan, LoginEvent::Expired]);
        let err = watch_login(events).unwrap_err();
        assert_eq!(err.to_string(), "login qrcode expired");
    }

    #[test]
    fn poll_failure_propagates() {
        let events = feed(vec![LoginEvent::Failed(bilibili::Error::Status {
            code: -412,
            message: "request was rejected".to_owned(),
        })]);

        let err = watch_login(events).unwrap_err();
        assert!(err.to_string().contains("-412"));
    }

    #[test]
    fn closed_channel_without_terminal_event_is_cancellation() {
        let events = feed(vec![LoginEvent::AwaitingScan]);
        let err = watch_login(events).unwrap_err();
        assert_eq!(err.to_string(), "login cancelled");
    }
}
