//! Exercises the `NEWKEYS` crossing explicitly in both possible orders: since
//! each side sends its own `NEWKEYS` as soon as it's ready, one side's message
//! can arrive before or after the local side has sent its own.

use std::sync::Arc;

use assh::{message, role::Role, KexMachine};

fn host_key() -> Arc<ssh_key::PrivateKey> {
    Arc::new(ssh_key::PrivateKey::random(&mut rand::thread_rng(), ssh_key::Algorithm::Ed25519).unwrap())
}

/// Drive both machines from `Idle` up to `KeysExchanged`, returning the
/// client's `NEWKEYS` and the server's, ready to be crossed in any order.
fn negotiate_up_to_keys_exchanged() -> (KexMachine, KexMachine) {
    let mut client = KexMachine::new(Role::Client, *b"SSH-2.0-client", *b"SSH-2.0-server");
    let mut server = KexMachine::new(Role::Server(host_key()), *b"SSH-2.0-client", *b"SSH-2.0-server");

    let client_init = client.start_key_exchange();
    let server_init = server.start_key_exchange();

    let client_response = client.handle_kex_init(server_init).unwrap();
    let server_response = server.handle_kex_init(client_init).unwrap();

    let ecdh_init = client_response.ecdh_init.expect("client begins ECDH immediately");
    assert!(server_response.ecdh_init.is_none());

    let ecdh_reply = server.handle_ecdh_init(&ecdh_init).unwrap().expect("legitimate ECDH_INIT");
    server.send_ecdh_reply(&ecdh_reply);
    client.handle_ecdh_reply(&ecdh_reply).unwrap();

    (client, server)
}

#[test]
fn client_sends_new_keys_before_server() {
    let (mut client, mut server) = negotiate_up_to_keys_exchanged();

    let client_protector_out = client.send_new_keys();
    let server_protector_in = server.handle_new_keys().unwrap();

    let server_protector_out = server.send_new_keys();
    let client_protector_in = client.handle_new_keys().unwrap();

    assert!(client.is_complete());
    assert!(server.is_complete());
    assert!(Arc::ptr_eq(&client_protector_out, &client_protector_in));
    assert!(Arc::ptr_eq(&server_protector_out, &server_protector_in));
}

#[test]
fn server_sends_new_keys_before_client() {
    let (mut client, mut server) = negotiate_up_to_keys_exchanged();

    let server_protector_out = server.send_new_keys();
    let client_protector_in = client.handle_new_keys().unwrap();

    let client_protector_out = client.send_new_keys();
    let server_protector_in = server.handle_new_keys().unwrap();

    assert!(client.is_complete());
    assert!(server.is_complete());
    assert!(Arc::ptr_eq(&client_protector_out, &client_protector_in));
    assert!(Arc::ptr_eq(&server_protector_out, &server_protector_in));
}

#[test]
fn both_sides_send_new_keys_before_either_receives() {
    let (mut client, mut server) = negotiate_up_to_keys_exchanged();

    // Neither has seen the other's NEWKEYS yet: both stay in KeysExchanged's
    // sibling state (NewKeysSent) until the peer's arrives.
    let client_protector_out = client.send_new_keys();
    let server_protector_out = server.send_new_keys();

    assert!(!client.is_complete());
    assert!(!server.is_complete());

    let server_protector_in = server.handle_new_keys().unwrap();
    let client_protector_in = client.handle_new_keys().unwrap();

    assert!(client.is_complete());
    assert!(server.is_complete());
    assert!(Arc::ptr_eq(&client_protector_out, &client_protector_in));
    assert!(Arc::ptr_eq(&server_protector_out, &server_protector_in));

    let sealed = client_protector_out.lock().unwrap().seal(b"race survived").unwrap();
    let opened = server_protector_in.lock().unwrap().open(&sealed).unwrap();
    assert_eq!(opened, b"race survived");
}

#[test]
fn handle_new_keys_before_keys_exchanged_is_a_protocol_violation() {
    let mut server = KexMachine::new(Role::Server(host_key()), *b"SSH-2.0-client", *b"SSH-2.0-server");
    server.start_key_exchange();

    assert!(matches!(server.handle_new_keys(), Err(assh::Error::UnexpectedMessage)));
}

#[test]
#[allow(unused_must_use)]
fn unused_new_keys_message_type_is_constructible() {
    message::NewKeys;
}
