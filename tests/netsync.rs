//! Host and client over an in-process link.

use std::sync::{Arc, Mutex};

use neon_rounds::game::input::{InputFrame, InputSample};
use neon_rounds::game::round::RoundPhase;
use neon_rounds::game::tick::MatchConfig;
use neon_rounds::network::protocol::NetMessage;
use neon_rounds::network::session::{MatchSession, SessionError};
use neon_rounds::network::transport::{ChannelTransport, Transport};

fn linked() -> (MatchSession, MatchSession) {
    let (host_link, client_link) = ChannelTransport::pair();
    let host = MatchSession::host(MatchConfig::default(), Box::new(host_link)).with_room("it");
    let client = MatchSession::client(MatchConfig::default(), Box::new(client_link)).with_room("it");
    (host, client)
}

fn pressing(flags: u8) -> InputSample {
    InputSample::new(InputFrame::new().with_flags(flags), InputFrame::default())
}

#[test]
fn test_client_mirrors_host_every_frame() {
    let (mut host, mut client) = linked();

    for frame in 0..120u32 {
        let flags = if frame % 30 < 15 { InputFrame::FLAG_RIGHT } else { InputFrame::FLAG_LEFT };
        host.frame(pressing(flags | InputFrame::FLAG_SHOOT));
        client.frame(pressing(InputFrame::FLAG_LEFT));

        let (h, c) = (host.state(), client.state());
        assert_eq!(c.tick, h.tick);
        assert_eq!(c.p1.position, h.p1.position);
        assert_eq!(c.p1.ammo, h.p1.ammo);
        assert_eq!(c.projectiles, h.projectiles);
    }

    // The client's held left reached the host
    assert!(host.state().p2.position.x < 1060.0);
    assert_eq!(client.session(), host.session());
}

#[test]
fn test_client_traffic_is_observable() {
    let (mut host, mut client) = linked();
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let seen = kinds.clone();
    client.subscribe(Box::new(move |msg: &NetMessage| seen.lock().unwrap().push(msg.kind())));

    host.frame(InputSample::default());
    client.frame(InputSample::default());

    assert_eq!(*kinds.lock().unwrap(), vec!["SESSION_UPDATE", "STATE"]);
}

#[test]
fn test_host_without_client_input_uses_idle() {
    let (mut host, _client) = linked();
    for _ in 0..30 {
        host.frame(InputSample::default());
    }
    // p2 never moved sideways or fired
    assert_eq!(host.state().p2.position.x, 1060.0);
    assert_eq!(host.state().p2.ammo, 5);
    assert!(host.state().projectiles.is_empty());
}

#[test]
fn test_client_disconnect_is_a_status_not_an_error() {
    let (mut host, mut client) = linked();
    host.frame(InputSample::default());
    client.frame(InputSample::default());

    client.leave();
    assert!(!client.is_active());

    for _ in 0..5 {
        host.frame(InputSample::default());
    }
    assert_eq!(host.state().tick, 6);
    assert!(host.status().contains("disconnected"));
    assert_eq!(host.phase(), &RoundPhase::Playing);
}

#[test]
fn test_only_authoritative_side_restarts() {
    let (mut host, mut client) = linked();
    assert_eq!(client.new_match(), Err(SessionError::NotAuthoritative));
    assert!(host.new_match().is_ok());
}

#[test]
fn test_raw_link_carries_messages() {
    let (mut a, mut b) = ChannelTransport::pair();
    a.send(NetMessage::CardsGenerated(Vec::new())).unwrap();
    assert_eq!(b.drain(), vec![NetMessage::CardsGenerated(Vec::new())]);
}
