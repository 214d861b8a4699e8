//! Bootstrap + Simulated Subsystems Integration Tests
//!
//! Runs the real sequencers over the simulated host and checks what the
//! subsystems observed.

use bootstrap::{
    BootError, BootState, Bootstrap, RuntimeFlags, SharedBuffer, StatusCode, StepId, Tty,
    VmLifecycle,
};
use vm_cli::SimulatedSubsystems;

fn bootstrap<'l>(
    host: SimulatedSubsystems,
    flags: RuntimeFlags,
    lifecycle: &'l VmLifecycle,
) -> (Bootstrap<'l, SimulatedSubsystems>, SharedBuffer) {
    let buffer = SharedBuffer::new();
    let vm = Bootstrap::with_lifecycle(host, flags, lifecycle).with_tty(Tty::new(buffer.clone()));
    (vm, buffer)
}

/// Test: every subsystem comes up in plan order
#[test]
fn test_full_bring_up() {
    let lifecycle = VmLifecycle::new();
    let (mut vm, _) = bootstrap(SimulatedSubsystems::new(), RuntimeFlags::default(), &lifecycle);

    vm.create_vm().expect("bring-up failed");

    let expected: Vec<_> = vm.plan().steps().map(|s| s.id()).collect();
    assert_eq!(vm.host().initialized(), expected.as_slice());
    assert_eq!(vm.state(), BootState::Initialized);
    assert!(vm.is_completed());

    let host = vm.host();
    assert_eq!(host.register_names().len(), 16);
    assert_eq!(host.compiler_threads(), 2);
    assert!(host.symbols().contains("java/lang/Object"));
    assert!(host.symbols().contains("referent"));
    assert!(!host.strings().is_empty());
    assert!(!host.mutexes().is_empty());
    assert_eq!(host.heap_capacity(), RuntimeFlags::default().max_heap_size);
}

/// Test: the handle scope of phase 2 is released afterwards
#[test]
fn test_phase2_handles_released() {
    let lifecycle = VmLifecycle::new();
    let (mut vm, _) = bootstrap(SimulatedSubsystems::new(), RuntimeFlags::default(), &lifecycle);

    vm.create_vm().unwrap();
    assert!(vm.handles().is_empty());
    assert!(vm.handles().high_water_mark() > 0);
}

/// Test: disabling the compiler still completes
#[test]
fn test_no_compiler() {
    let lifecycle = VmLifecycle::new();
    let flags = RuntimeFlags {
        use_compiler: false,
        ..RuntimeFlags::default()
    };
    let (mut vm, _) = bootstrap(SimulatedSubsystems::new(), flags, &lifecycle);

    vm.create_vm().unwrap();
    assert_eq!(vm.host().compiler_threads(), 0);
}

/// Test: a heap below the minimum stops phase 2 at the heap step
#[test]
fn test_heap_failure() {
    let lifecycle = VmLifecycle::new();
    let flags = RuntimeFlags {
        max_heap_size: 1024 * 1024,
        ..RuntimeFlags::default()
    };
    let (mut vm, _) = bootstrap(SimulatedSubsystems::new(), flags, &lifecycle);

    vm.run_phase1();
    assert_eq!(vm.run_phase2(), StatusCode::Error);
    assert_eq!(vm.state(), BootState::Failed);

    let initialized = vm.host().initialized();
    assert_eq!(initialized.last(), Some(&StepId::StubRoutinesPhase1));
    assert!(!vm.is_completed());
}

/// Test: an exhausted code cache is a fatal abort, not an error status
#[test]
#[should_panic(expected = "infallible step 'stub_routines_1'")]
fn test_code_cache_exhaustion_is_fatal() {
    let lifecycle = VmLifecycle::new();
    let flags = RuntimeFlags {
        reserved_code_cache_size: 4096,
        ..RuntimeFlags::default()
    };
    let (mut vm, _) = bootstrap(SimulatedSubsystems::new(), flags, &lifecycle);
    vm.run_phase1();
    let _ = vm.run_phase2();
}

/// Test: post-init failure leaves the VM incomplete
#[test]
fn test_post_init_failure() {
    let lifecycle = VmLifecycle::new();
    let host = SimulatedSubsystems::new().with_fault(Some(StepId::UniversePostInit));
    let (mut vm, buffer) = bootstrap(
        host,
        RuntimeFlags {
            print_flags_final: true,
            ..RuntimeFlags::default()
        },
        &lifecycle,
    );

    let err = vm.create_vm().unwrap_err();
    assert_eq!(
        err,
        BootError::StepFailed {
            step: StepId::UniversePostInit
        }
    );
    assert!(!vm.host().initialized().contains(&StepId::JavaClasses));
    assert!(!vm.is_completed());
    assert_eq!(buffer.contents(), "");
}

/// Test: completion cannot be claimed before the universe is ready
#[test]
fn test_completion_before_bring_up() {
    let lifecycle = VmLifecycle::new();
    let (vm, _) = bootstrap(SimulatedSubsystems::new(), RuntimeFlags::default(), &lifecycle);

    assert!(matches!(
        vm.try_set_completed(),
        Err(BootError::ContractViolation(_))
    ));
}

/// Test: teardown releases perf memory once and dumps statistics once
#[test]
fn test_double_shutdown() {
    let lifecycle = VmLifecycle::new();
    let flags = RuntimeFlags {
        print_safepoint_statistics: true,
        print_string_table_statistics: true,
        ..RuntimeFlags::default()
    };
    let (mut vm, buffer) = bootstrap(SimulatedSubsystems::new(), flags, &lifecycle);
    vm.create_vm().unwrap();
    assert!(vm.host().has_perf_memory());

    vm.run_shutdown();
    let first = buffer.contents();
    vm.run_shutdown();

    assert!(!vm.host().has_perf_memory());
    assert_eq!(buffer.contents(), first);
    assert_eq!(first.matches("SymbolTable statistics:").count(), 1);
    assert!(first.contains("Number of safepoints:         1"));
}

/// Test: the flag dump lists the resolved values
#[test]
fn test_flag_dump() {
    let lifecycle = VmLifecycle::new();
    let flags = RuntimeFlags {
        print_flags_final: true,
        max_heap_size: 64 * 1024 * 1024,
        ..RuntimeFlags::default()
    };
    let (mut vm, buffer) = bootstrap(SimulatedSubsystems::new(), flags, &lifecycle);
    vm.create_vm().unwrap();

    let out = buffer.contents();
    let line = out
        .lines()
        .find(|l| l.contains("MaxHeapSize"))
        .expect("MaxHeapSize missing from flag dump");
    assert!(line.contains("67108864"));
    assert!(line.trim_start().starts_with("uintx"));
}
