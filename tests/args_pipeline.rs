//! Integration tests for the launch pipeline, driven through the role launchers.

mod common;

use common::{launch, launch_with, position, raw_args};
use nodelaunch::args::{LaunchError, LaunchDirective};
use nodelaunch::peer::StaticPeers;
use nodelaunch::roles::Role;

// =============================================================================
// NETWORKING NODE
// =============================================================================

#[test]
fn sentinel_node_without_sentinel_ip() {
    let invs = launch(
        Role::Network,
        &["--host-ip=sn-1", "--sentinel=1", "--sn-api-port=30304"],
    )
    .unwrap();

    assert_eq!(invs.len(), 1);
    let main = &invs[0];
    assert_eq!(main.env_value("HOST_IP"), Some("sn-1"));
    assert_eq!(main.env_value("SENTINEL"), Some("1"));
    assert_eq!(main.env_value("SN_API_PORT"), Some("30304"));
    assert!(main.publications().contains(&"30304:30304/tcp"));
    assert_eq!(main.env_value("SENTINEL_IP"), None);
}

#[test]
fn full_network_invocation() {
    let invs = launch(
        Role::Network,
        &["--host-ip=sn-1", "--sentinel=1", "--sn-api-port=30304"],
    )
    .unwrap();

    assert_eq!(
        invs[0].command_line(),
        raw_args(&[
            "docker",
            "run",
            "--name",
            "sn-node",
            "--env",
            "HOST_IP=sn-1",
            "--env",
            "SENTINEL=1",
            "--env",
            "SN_API_PORT=30304",
            "--env",
            "SN_P2P_PORT=30303",
            "--publish",
            "30304:30304/tcp",
            "--publish",
            "30303:30303/tcp",
            "--publish",
            "30303:30303/udp",
            "sn-node:latest",
        ])
    );
}

#[test]
fn missing_sentinel_is_fatal() {
    let err = launch(Role::Network, &["--host-ip=sn-1"]).unwrap_err();
    assert!(matches!(&err, LaunchError::MissingField { field, .. } if field == "sentinel"));
    assert!(err.to_string().contains("missing sentinel specification"));
}

#[test]
fn non_sentinel_node_still_needs_a_sentinel() {
    let err = launch(Role::Network, &["--host-ip=sn-1", "--sentinel=0"]).unwrap_err();
    assert!(err.to_string().contains("missing sentinel specification"));

    let invs = launch(
        Role::Network,
        &["--host-ip=sn-1", "--sentinel=0", "--sentinel-api-service=sentinel.svc"],
    )
    .unwrap();
    assert_eq!(invs[0].env_value("SENTINEL"), Some("0"));
    assert_eq!(invs[0].env_value("SENTINEL_API_SERVICE"), Some("sentinel.svc"));
}

#[test]
fn missing_host_address_is_fatal() {
    let err = launch(Role::Network, &["--sentinel"]).unwrap_err();
    assert!(err.to_string().contains("missing host address specification"));
}

#[test]
fn sentinel_resolved_from_container() {
    let peers = StaticPeers::new().with_peer("sentinel-0", "10.1.0.9");
    let invs = launch_with(
        Role::Network,
        &["--host-ip=sn-2", "--sentinel-container", "sentinel-0"],
        &peers,
    )
    .unwrap();
    assert_eq!(invs[0].env_value("SENTINEL_IP"), Some("10.1.0.9"));
}

#[test]
fn static_sentinel_ip_skips_resolution() {
    // The peer table is empty: any query would fail.
    let invs = launch_with(
        Role::Network,
        &[
            "--host-ip=sn-2",
            "--sentinel-container=sentinel-0",
            "--sentinel-ip=10.1.0.1",
        ],
        &StaticPeers::new(),
    )
    .unwrap();
    assert_eq!(invs[0].env_value("SENTINEL_IP"), Some("10.1.0.1"));
}

#[test]
fn unresolvable_sentinel_container_is_fatal() {
    let err = launch_with(
        Role::Network,
        &["--host-ip=sn-2", "--sentinel-container=sentinel-0"],
        &StaticPeers::new(),
    )
    .unwrap_err();
    assert!(matches!(err, LaunchError::PeerResolution { peer, .. } if peer == "sentinel-0"));
}

#[test]
fn endpoint_alternation() {
    let invs = launch(
        Role::Network,
        &[
            "--host-ip=sn-1",
            "--sentinel",
            "--sn-p2p-port=4001",
            "--sn-api-service=sn-api.default.svc",
        ],
    )
    .unwrap();
    let main = &invs[0];
    assert_eq!(main.env_value("SN_API_PORT"), Some("30304"));
    assert_eq!(main.env_value("SN_P2P_PORT"), Some("4001"));
    assert_eq!(main.env_value("SN_API_SERVICE"), Some("sn-api.default.svc"));
    assert_eq!(
        main.publications(),
        vec!["30304:30304/tcp", "4001:4001/tcp", "4001:4001/udp"]
    );
}

#[test]
fn conflicting_ports_are_rejected() {
    let err = launch(
        Role::Network,
        &["--host-ip=sn-1", "--sentinel", "--sn-p2p-port=30304"],
    )
    .unwrap_err();
    assert!(matches!(err, LaunchError::MalformedArgument { option, .. } if option == "--sn-p2p-port"));
}

// =============================================================================
// LEARNING NODE AND SIDECAR
// =============================================================================

#[test]
fn sidecar_gets_its_own_target() {
    let invs = launch(Role::Learning, &["--ml-image=foo", "--host-ip=10.0.0.1"]).unwrap();
    assert_eq!(invs.len(), 2);

    let (main, ml) = (&invs[0], &invs[1]);
    assert_eq!(main.target, "learning");
    assert_eq!(main.container, "ln-node");
    assert_eq!(ml.target, "ml");
    assert_eq!(ml.container, "ln-node-ml");

    // Main: host address plus the networking node it talks to.
    assert_eq!(
        main.env(),
        vec![
            ("HOST_IP", "10.0.0.1"),
            ("SN_IP", "172.17.0.2"),
            ("SN_API_PORT", "30304"),
        ]
    );

    // Sidecar: host address through fallback, nothing else from main.
    assert_eq!(
        ml.env(),
        vec![("HOST_IP", "10.0.0.1"), ("ML_MODEL_DIR", "/models")]
    );
    assert_eq!(
        ml.args,
        raw_args(&[
            "run",
            "--name",
            "ln-node-ml",
            "--env",
            "HOST_IP=10.0.0.1",
            "--env",
            "ML_MODEL_DIR=/models",
            "--network=container:ln-node",
            "--volumes-from=ln-node",
            "foo",
        ])
    );
}

#[test]
fn sidecar_follows_renamed_main() {
    let invs = launch(Role::Learning, &["--name=edge-ln", "--ml-image=foo"]).unwrap();
    assert_eq!(invs[1].container, "edge-ln-ml");
    assert!(invs[1].args.contains(&"--network=container:edge-ln".to_string()));
    assert!(invs[1].args.contains(&"--volumes-from=edge-ln".to_string()));
}

#[test]
fn sidecar_does_not_inherit_main_image_or_ports() {
    let invs = launch(
        Role::Learning,
        &[
            "--image=registry/ln:2",
            "--ln-port=8080",
            "--publish=9000:9000",
            "--ml-image=ml:1",
        ],
    )
    .unwrap();
    let (main, ml) = (&invs[0], &invs[1]);
    assert_eq!(main.publications(), vec!["9000:9000", "8080:8080/tcp"]);
    assert!(ml.publications().is_empty());
    assert_eq!(ml.args.last().map(String::as_str), Some("ml:1"));
    assert_eq!(main.args.last().map(String::as_str), Some("registry/ln:2"));
}

#[test]
fn api_key_is_shared_license_file_is_not() {
    let invs = launch(
        Role::Learning,
        &[
            "--api-key=k-123",
            "--license-file=/etc/ln/license",
            "--ml-image=foo",
        ],
    )
    .unwrap();
    let (main, ml) = (&invs[0], &invs[1]);
    assert_eq!(main.env_value("API_KEY"), Some("k-123"));
    assert_eq!(ml.env_value("API_KEY"), Some("k-123"));
    assert_eq!(main.env_value("LICENSE_FILE"), Some("/etc/node/license"));
    assert_eq!(ml.env_value("LICENSE_FILE"), None);
    assert!(main
        .directives
        .contains(&LaunchDirective::Volume("/etc/ln/license:/etc/node/license:ro".into())));
}

#[test]
fn sidecar_without_image_fails() {
    let err = launch(Role::Learning, &["--sidecar=ml", "--ml-cmd=serve"]).unwrap_err();
    assert!(matches!(&err, LaunchError::MissingField { target, .. } if target == "ml"));
    assert!(err.to_string().contains("missing ml image specification"));
}

#[test]
fn declared_sidecar_without_options_fails() {
    let err = launch(Role::Learning, &["--sidecar=ml", "--host-ip=10.0.0.1"]).unwrap_err();
    assert!(matches!(&err, LaunchError::DuplicateTarget { name, .. } if name == "ml"));
    assert!(err.to_string().starts_with("duplicate registration of sidecar 'ml'"));
}

#[test]
fn declared_sidecar_with_options() {
    let invs = launch(Role::Learning, &["--sidecar", "ml", "--ml-image", "foo"]).unwrap();
    assert_eq!(invs.len(), 2);
}

#[test]
fn sidecar_cannot_pick_its_own_network() {
    let err = launch(Role::Learning, &["--ml-image=foo", "--ml-network=host"]).unwrap_err();
    assert!(matches!(err, LaunchError::MalformedArgument { option, .. } if option == "--ml-network"));
}

#[test]
fn duplicate_and_unknown_sidecars() {
    let err = launch(Role::Learning, &["--sidecar=ml", "--sidecar=ml"]).unwrap_err();
    assert!(matches!(err, LaunchError::DuplicateTarget { .. }));

    let err = launch(Role::Network, &["--sidecar=ml"]).unwrap_err();
    assert!(matches!(err, LaunchError::UnknownSidecar { available, .. } if available == "none"));
}

#[test]
fn sidecar_cannot_declare_a_sidecar() {
    let err = launch(Role::Learning, &["--ml-image=foo", "--ml-sidecar=ml"]).unwrap_err();
    assert!(matches!(&err, LaunchError::Unsupported { option, .. } if option == "--ml-sidecar"));
}

#[test]
fn learning_node_options_are_refused_for_the_sidecar() {
    for arg in [
        "--ml-model-dir=/srv/models",
        "--ml-sn-ip=10.0.0.5",
        "--ml-ln-port=8080",
    ] {
        let err = launch(Role::Learning, &["--ml-image=foo", arg]).unwrap_err();
        let expected = arg.split('=').next().unwrap_or_default();
        assert!(
            matches!(&err, LaunchError::Unsupported { option, .. } if option == expected),
            "{arg}: {err}"
        );
    }
}

#[test]
fn sidecar_errors_name_the_option_as_written() {
    let err = launch(Role::Learning, &["--ml-image"]).unwrap_err();
    assert!(matches!(&err, LaunchError::MissingValue { option } if option == "--ml-image"));

    let err = launch(Role::Learning, &["--ml-image=foo", "--ml-log-level=loud"]).unwrap_err();
    assert!(matches!(&err, LaunchError::MalformedArgument { option, .. } if option == "--ml-log-level"));
    assert!(err.to_string().starts_with("--ml-log-level:"));
}

#[test]
fn sidecar_command_takes_single_dash_argument() {
    let invs = launch(Role::Learning, &["--ml-image=foo", "--ml-cmd", "-v", "--detach"]).unwrap();
    assert_eq!(invs[1].args.last().map(String::as_str), Some("-v"));
    assert!(!invs[0].args.contains(&"-v".to_string()));
}

#[test]
fn lookalike_tokens_create_no_sidecar() {
    let invs = launch(Role::Learning, &["--ml", "--mlflow-uri=http://x", "--model-dir=/srv/models"]).unwrap();
    assert_eq!(invs.len(), 1);
    // Unclaimed look-alikes are forwarded, not dropped.
    assert!(invs[0].args.contains(&"--ml".to_string()));
    assert!(invs[0].args.contains(&"--mlflow-uri=http://x".to_string()));
    assert_eq!(invs[0].env_value("MODEL_DIR"), Some("/models"));
}

#[test]
fn networking_node_address_precedence() {
    // Static IP wins; no query is made against the empty table.
    let invs = launch_with(
        Role::Learning,
        &["--sn-ip=10.0.0.5", "--sn-container=other"],
        &StaticPeers::new(),
    )
    .unwrap();
    assert_eq!(invs[0].env_value("SN_IP"), Some("10.0.0.5"));

    let invs = launch_with(
        Role::Learning,
        &["--sn-api-service=sn.svc"],
        &StaticPeers::new(),
    )
    .unwrap();
    assert_eq!(invs[0].env_value("SN_API_SERVICE"), Some("sn.svc"));
    assert_eq!(invs[0].env_value("SN_IP"), None);

    let peers = StaticPeers::new().with_peer("sn-east", "172.18.0.3");
    let invs = launch_with(Role::Learning, &["--sn-container=sn-east"], &peers).unwrap();
    assert_eq!(invs[0].env_value("SN_IP"), Some("172.18.0.3"));
}

#[test]
fn no_networking_node_is_fatal() {
    let err = launch_with(Role::Learning, &[], &StaticPeers::new()).unwrap_err();
    assert!(matches!(err, LaunchError::PeerResolution { peer, .. } if peer == "sn-node"));
}

// =============================================================================
// ORDERING AND DETERMINISM
// =============================================================================

#[test]
fn same_input_same_output() {
    let args = [
        "--host-ip=10.0.0.1",
        "--ml-image=foo",
        "--cpus=2",
        "--env=A=1",
        "--ml-env=B=2",
        "--detach",
        "--label",
        "tier=edge",
    ];
    let first = launch(Role::Learning, &args).unwrap();
    let second = launch(Role::Learning, &args).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unrecognized_tokens_follow_structured_directives() {
    let invs = launch(
        Role::Network,
        &[
            "--cpus=2",
            "--host-ip=sn-1",
            "--label",
            "tier=edge",
            "--sentinel",
            "--memory=4g",
            "--detach",
        ],
    )
    .unwrap();
    let main = &invs[0];

    let cpus = position(main, "--cpus=2");
    let label = position(main, "--label");
    let memory = position(main, "--memory=4g");
    assert!(cpus < label && label < memory);
    assert_eq!(main.args[label + 1], "tier=edge");

    // After every structured directive, before the image.
    assert!(position(main, "--detach") < cpus);
    assert!(position(main, "30303:30303/udp") < cpus);
    assert!(memory < position(main, "sn-node:latest"));
}

#[test]
fn entrypoint_image_and_command_come_last() {
    let invs = launch(
        Role::Network,
        &[
            "--cmd=serve",
            "--host-ip=sn-1",
            "--entrypoint=/bin/sn",
            "--sentinel",
            "--tag=1.4",
            "--cmd",
            "--verbose-mode",
        ],
    );
    // A value option refuses an option-looking argument.
    assert!(matches!(invs, Err(LaunchError::MissingValue { option }) if option == "--cmd"));

    let invs = launch(
        Role::Network,
        &[
            "--cmd=serve",
            "--host-ip=sn-1",
            "--entrypoint=/bin/sn",
            "--sentinel",
            "--tag=1.4",
            "--cmd=--verbose-mode",
        ],
    )
    .unwrap();
    let tail: Vec<&str> = invs[0].args.iter().rev().take(5).rev().map(String::as_str).collect();
    assert_eq!(
        tail,
        vec!["--entrypoint", "/bin/sn", "sn-node:1.4", "serve", "--verbose-mode"]
    );
}

#[test]
fn command_takes_single_dash_argument() {
    let invs = launch(
        Role::Network,
        &["--host-ip=sn-1", "--sentinel", "--cmd", "-v", "--detach"],
    )
    .unwrap();
    let main = &invs[0];
    assert_eq!(main.args.last().map(String::as_str), Some("-v"));
    assert!(position(main, "--detach") < position(main, "sn-node:latest"));
}

// =============================================================================
// MALFORMED ARGUMENTS
// =============================================================================

#[test]
fn malformed_values_abort() {
    let cases: &[(&[&str], &str)] = &[
        (&["--host-ip=not a host"], "--host-ip"),
        (&["--sn-api-port=http"], "--sn-api-port"),
        (&["--env=1BAD=x"], "--env"),
        (&["--volume=relative"], "--volume"),
        (&["--log-level=loud"], "--log-level"),
        (&["--sentinel=maybe"], "--sentinel"),
        (&["--license-file=license.txt"], "--license-file"),
    ];
    for (args, expected) in cases {
        match launch(Role::Network, args) {
            Err(LaunchError::MalformedArgument { option, .. }) => assert_eq!(&option, expected),
            other => panic!("{args:?}: expected malformed {expected}, got {other:?}"),
        }
    }
}

#[test]
fn flag_with_value_and_missing_value() {
    assert!(matches!(
        launch(Role::Network, &["--detach=yes"]),
        Err(LaunchError::UnexpectedValue { .. })
    ));
    assert!(matches!(
        launch(Role::Network, &["--host-ip"]),
        Err(LaunchError::MissingValue { .. })
    ));
}
