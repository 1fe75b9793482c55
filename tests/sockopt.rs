use can_sockopt::{
    filter::encode_filters, CanConnection, CanFilter, CanSocket, NullSink, OptionApplier,
    RawOptConfig, SockOptError, SocketHandle, SocketOptions, SocketRegistry, SocketType,
    CAN_RAW_ERR_FILTER, CAN_RAW_FD_FRAMES, CAN_RAW_FILTER, CAN_RAW_JOIN_FILTERS,
    CAN_RAW_LOOPBACK, CAN_RAW_RECV_OWN_MSGS, FILTER_RECORD_SIZE,
};
use libc::{c_int, EINVAL, ENOPROTOOPT, ENOTCONN, SOCK_DGRAM, SOCK_RAW, SOCK_STREAM};
use std::collections::HashMap;

// The limit used by most of these tests.
const MAX: usize = 16;

const OPTIONS: [c_int; 6] = [
    CAN_RAW_FILTER,
    CAN_RAW_ERR_FILTER,
    CAN_RAW_LOOPBACK,
    CAN_RAW_RECV_OWN_MSGS,
    CAN_RAW_FD_FRAMES,
    CAN_RAW_JOIN_FILTERS,
];

fn applier() -> OptionApplier<NullSink> {
    OptionApplier::with_config(RawOptConfig::default().with_filter_max(MAX), NullSink)
}

fn filters(n: usize) -> Vec<CanFilter> {
    (0..n as u32)
        .map(|i| CanFilter::new(0x100 + i, 0x7FF))
        .collect()
}

// A valid value for each option.
fn valid_value(option: c_int) -> Vec<u8> {
    match option {
        CAN_RAW_FILTER => encode_filters(&filters(2)),
        _ => 1i32.to_ne_bytes().to_vec(),
    }
}

#[test]
fn test_filter_partial_record() {
    let mut applier = applier();
    let mut sock = CanSocket::raw();
    let before = sock.connection().clone();

    let value = encode_filters(&filters(3));
    for len in (1..value.len()).filter(|n| n % FILTER_RECORD_SIZE != 0) {
        assert_eq!(
            applier.apply(&mut sock, CAN_RAW_FILTER, &value[..len]),
            Err(SockOptError::InvalidArgument)
        );
        assert_eq!(sock.connection(), &before);
    }
}

#[test]
fn test_filter_count_limit() {
    let mut applier = applier();
    let mut sock = CanSocket::raw();

    let at_max = filters(MAX);
    applier
        .apply(&mut sock, CAN_RAW_FILTER, &encode_filters(&at_max))
        .unwrap();
    assert_eq!(sock.connection().filters(), &at_max[..]);

    let over = filters(MAX + 1);
    assert_eq!(
        applier.apply(&mut sock, CAN_RAW_FILTER, &encode_filters(&over)),
        Err(SockOptError::InvalidArgument)
    );
    assert_eq!(sock.connection().filters(), &at_max[..]);
}

#[test]
fn test_filter_count_limit_default() {
    let mut applier = OptionApplier::new(NullSink);
    let mut sock = CanSocket::raw();
    let max = applier.config().filter_max;

    let value = encode_filters(&vec![CanFilter::accept_all(); max + 1]);
    assert_eq!(
        applier.apply(&mut sock, CAN_RAW_FILTER, &value),
        Err(SockOptError::InvalidArgument)
    );
    applier
        .apply(&mut sock, CAN_RAW_FILTER, &value[..max * FILTER_RECORD_SIZE])
        .unwrap();
    assert_eq!(sock.connection().filters().len(), max);
}

#[test]
fn test_empty_filter_clears() {
    let mut applier = applier();
    let mut sock = CanSocket::raw();

    applier
        .apply(&mut sock, CAN_RAW_FILTER, &encode_filters(&filters(4)))
        .unwrap();
    assert_eq!(sock.connection().filters().len(), 4);

    applier.apply(&mut sock, CAN_RAW_FILTER, &[]).unwrap();
    assert!(sock.connection().filters().is_empty());
}

#[test]
fn test_unknown_option() {
    let mut applier = applier();

    for sock_type in [SOCK_RAW, SOCK_DGRAM, SOCK_STREAM] {
        let mut sock = CanSocket::new(sock_type);
        for option in [0, 7, 100, -1] {
            assert_eq!(
                applier.apply(&mut sock, option, &1i32.to_ne_bytes()),
                Err(SockOptError::UnsupportedOption(option))
            );
        }
    }
}

#[test]
fn test_not_raw_socket() {
    let mut applier = applier();

    for sock_type in [SocketType::Dgram, SocketType::Stream, SocketType::Other(10)] {
        let mut sock = CanSocket::new(sock_type);
        for option in OPTIONS {
            assert_eq!(
                applier.apply(&mut sock, option, &valid_value(option)),
                Err(SockOptError::NotConnected)
            );
            // Even a malformed value is rejected for the socket type first
            assert_eq!(
                applier.apply(&mut sock, option, &[1, 2, 3]),
                Err(SockOptError::NotConnected)
            );
        }
        assert_eq!(sock.connection(), &CanConnection::new());
    }
}

#[test]
fn test_valid_values_accepted() {
    let mut applier = applier();
    let mut sock = CanSocket::raw();

    for option in OPTIONS {
        applier
            .apply(&mut sock, option, &valid_value(option))
            .unwrap();
    }

    let conn = sock.connection();
    assert_eq!(conn.filters(), &filters(2)[..]);
    assert_eq!(conn.err_mask().bits(), 1);
    assert!(conn.loopback());
    assert!(conn.recv_own_msgs());
    assert!(conn.fd_frames());
    assert!(conn.join_filters());
}

#[test]
fn test_loopback_idempotent() {
    let mut applier = applier();
    let mut sock = CanSocket::raw();
    let off = 0i32.to_ne_bytes();

    applier.apply(&mut sock, CAN_RAW_LOOPBACK, &off).unwrap();
    let once = sock.connection().clone();

    applier.apply(&mut sock, CAN_RAW_LOOPBACK, &off).unwrap();
    assert_eq!(sock.connection(), &once);
    assert!(!once.loopback());
}

#[test]
fn test_flag_length_mismatch() {
    let mut applier = applier();
    let mut sock = CanSocket::raw();

    for option in &OPTIONS[1..] {
        for value in [&[][..], &[1u8][..], &[1, 0, 0, 0, 0, 0, 0, 0][..]] {
            assert_eq!(
                applier.apply(&mut sock, *option, value),
                Err(SockOptError::InvalidArgument)
            );
        }
    }
    assert_eq!(sock.connection(), &CanConnection::new());
}

#[test]
fn test_three_filters() {
    let mut applier = applier();
    let mut sock = CanSocket::raw();

    let input = vec![
        CanFilter::new(0x123, 0x7FF),
        CanFilter::new_inverted(0x200, 0x700),
        CanFilter::new(0x1234_5678 | libc::CAN_EFF_FLAG, 0x1FFF_FFFF),
    ];
    let value = encode_filters(&input);
    assert_eq!(value.len(), 3 * FILTER_RECORD_SIZE);

    applier.apply(&mut sock, CAN_RAW_FILTER, &value).unwrap();
    assert_eq!(sock.connection().filters(), &input[..]);
    assert!(sock.connection().filters()[1].is_inverted());
}

#[test]
fn test_return_codes() -> anyhow::Result<()> {
    let mut applier = applier();
    let mut registry = HashMap::new();
    registry.insert(SocketHandle(5), CanSocket::raw());
    registry.insert(SocketHandle(6), CanSocket::new(SOCK_DGRAM));

    let on = 1i32.to_ne_bytes();
    let raw = SocketHandle(5);

    assert_eq!(applier.setsockopt(&mut registry, raw, CAN_RAW_FD_FRAMES, &on), 0);
    assert_eq!(
        applier.setsockopt(&mut registry, raw, CAN_RAW_FILTER, &[0; 5]),
        -EINVAL
    );
    assert_eq!(applier.setsockopt(&mut registry, raw, 99, &on), -ENOPROTOOPT);
    assert_eq!(
        applier.setsockopt(&mut registry, SocketHandle(6), CAN_RAW_FD_FRAMES, &on),
        -ENOTCONN
    );

    let conn = registry
        .connection(raw)
        .ok_or_else(|| anyhow::anyhow!("socket 5 missing"))?;
    assert!(conn.fd_frames());
    assert_eq!(conn.mtu(), libc::CANFD_MTU);
    Ok(())
}

#[test]
fn test_sink_receives_filters() -> anyhow::Result<()> {
    let mut installed = Vec::new();
    let mut applier =
        OptionApplier::new(|_: &CanConnection, f: &[CanFilter]| -> can_sockopt::Result<()> {
            installed.push(f.to_vec());
            Ok(())
        });
    let mut sock = CanSocket::raw();

    applier.apply(&mut sock, CAN_RAW_FILTER, &encode_filters(&filters(3)))?;
    // Rejected lists never reach the driver
    assert_eq!(
        applier.apply(&mut sock, CAN_RAW_FILTER, &[0; 3]),
        Err(SockOptError::InvalidArgument)
    );
    applier.bind(&mut sock).set_filter_drop_all()?;
    drop(applier);

    assert_eq!(installed, vec![filters(3), vec![]]);
    Ok(())
}

#[test]
fn test_read_back() -> anyhow::Result<()> {
    let mut applier = applier();
    let mut sock = CanSocket::raw();

    {
        let mut bound = applier.bind(&mut sock);
        bound.set_filters(&filters(2))?;
        bound.set_error_filter(0xFFFF_FFFF)?;
        bound.set_join_filters(true)?;
    }

    let mut buf = [0u8; 64];
    let n = sock.get_option(CAN_RAW_FILTER, &mut buf)?;
    assert_eq!(&buf[..n], &encode_filters(&filters(2))[..]);

    let n = sock.get_option(CAN_RAW_ERR_FILTER, &mut buf)?;
    assert_eq!(&buf[..n], &libc::CAN_ERR_MASK.to_ne_bytes());

    let n = sock.get_option(CAN_RAW_JOIN_FILTERS, &mut buf)?;
    assert_eq!(&buf[..n], &1i32.to_ne_bytes());

    assert_eq!(
        sock.get_option(CAN_RAW_FILTER, &mut buf[..8]),
        Err(SockOptError::OutOfRange { needed: 16 })
    );
    Ok(())
}
