//! Contract tests for the bootstrap
//!
//! These tests verify the operations exposed to the embedding process
//! (`run_phase1`, `run_phase2`, `is_completed`, `set_completed`,
//! `run_shutdown`) and the laws they promise.

#[path = "../common/mod.rs"]
mod common;

use bootstrap::{
    BootError, BootPlan, RuntimeFlags, StatusCode, StepId, TeardownAction, VmLifecycle,
};
use common::{bootstrap_with, fallible_primary_steps, RecordingHost};
use proptest::prelude::*;

fn dump_flags() -> RuntimeFlags {
    RuntimeFlags {
        print_safepoint_statistics: true,
        print_string_table_statistics: true,
        ..RuntimeFlags::default()
    }
}

/// Contract: a full successful bring-up reports Ok and completes
#[test]
fn contract_full_success() {
    let lifecycle = VmLifecycle::new();
    let (mut vm, _) = bootstrap_with(RecordingHost::new(), RuntimeFlags::default(), &lifecycle);

    vm.run_phase1();
    assert_eq!(vm.run_phase2(), StatusCode::Ok);
    assert!(!vm.is_completed());
    vm.set_completed();
    assert!(vm.is_completed());

    let expected: Vec<_> = BootPlan::standard().steps().map(|s| s.id()).collect();
    assert_eq!(vm.host().calls, expected);
}

/// Contract: heap construction failure stops everything after it
#[test]
fn contract_heap_failure_stops_sequence() {
    let lifecycle = VmLifecycle::new();
    let (mut vm, _) = bootstrap_with(
        RecordingHost::failing_at(StepId::Universe),
        RuntimeFlags::default(),
        &lifecycle,
    );

    vm.run_phase1();
    assert_eq!(vm.run_phase2(), StatusCode::Error);

    let plan = BootPlan::standard();
    let heap = plan.primary().position(StepId::Universe).unwrap();
    for later in &plan.primary().steps()[heap + 1..] {
        assert_eq!(vm.host().count(later.id()), 0, "{} ran", later.name());
    }
    assert!(!vm.is_completed());
}

/// Contract: a failing post-init hook fails the sequence although every
/// earlier step succeeded
#[test]
fn contract_post_init_failure_is_error() {
    let lifecycle = VmLifecycle::new();
    let (mut vm, buffer) = bootstrap_with(
        RecordingHost::failing_at(StepId::UniversePostInit),
        RuntimeFlags {
            print_flags_final: true,
            ..RuntimeFlags::default()
        },
        &lifecycle,
    );

    vm.run_phase1();
    assert_eq!(vm.run_phase2(), StatusCode::Error);

    let plan = BootPlan::standard();
    let post_init = plan.primary().position(StepId::UniversePostInit).unwrap();
    for earlier in &plan.primary().steps()[..post_init] {
        assert_eq!(vm.host().count(earlier.id()), 1);
    }
    assert_eq!(vm.host().count(StepId::JavaClasses), 0);
    assert_eq!(vm.host().count(StepId::StubRoutinesPhase2), 0);
    assert_eq!(buffer.contents(), "");
}

/// Contract: set_completed requires a fully initialized object model
#[test]
fn contract_set_completed_precondition() {
    let lifecycle = VmLifecycle::new();
    let (vm, _) = bootstrap_with(RecordingHost::new(), RuntimeFlags::default(), &lifecycle);

    assert!(matches!(
        vm.try_set_completed(),
        Err(BootError::ContractViolation(_))
    ));
    assert!(!vm.is_completed());
}

/// Contract: the precondition violation is fatal in debug builds
#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "contract violation")]
fn contract_set_completed_violation_is_fatal_in_debug() {
    let lifecycle = VmLifecycle::new();
    let (vm, _) = bootstrap_with(RecordingHost::new(), RuntimeFlags::default(), &lifecycle);
    vm.set_completed();
}

/// Contract: a second set_completed with the precondition holding is harmless
#[test]
fn contract_set_completed_twice() {
    let lifecycle = VmLifecycle::new();
    let (mut vm, _) = bootstrap_with(RecordingHost::new(), RuntimeFlags::default(), &lifecycle);
    vm.create_vm().unwrap();
    vm.set_completed();
    assert!(vm.is_completed());
}

/// Contract: is_completed stays false through every step until set_completed
#[test]
fn contract_not_completed_during_bootstrap() {
    struct Observer<'l> {
        inner: RecordingHost,
        lifecycle: &'l VmLifecycle,
        observed_completed: bool,
    }

    impl bootstrap::UniverseStatus for Observer<'_> {
        fn is_fully_initialized(&self) -> bool {
            self.inner.fully_initialized
        }
    }

    impl bootstrap::Subsystems for Observer<'_> {
        fn initialize(&mut self, step: StepId, cx: &bootstrap::StepContext<'_>) -> StatusCode {
            self.observed_completed |= self.lifecycle.completion().is_completed();
            self.inner.initialize(step, cx)
        }

        fn teardown(
            &mut self,
            action: TeardownAction,
            out: &mut dyn std::io::Write,
        ) -> Result<(), bootstrap::SubsystemError> {
            self.inner.teardown(action, out)
        }
    }

    let lifecycle = VmLifecycle::new();
    let host = Observer {
        inner: RecordingHost::new(),
        lifecycle: &lifecycle,
        observed_completed: false,
    };
    let mut vm = bootstrap::Bootstrap::with_lifecycle(host, RuntimeFlags::default(), &lifecycle)
        .with_tty(bootstrap::Tty::new(bootstrap::SharedBuffer::new()));

    vm.create_vm().unwrap();
    assert!(!vm.host().observed_completed);
    assert!(vm.is_completed());
}

/// Contract: two shutdowns with dumps enabled run each dump once
#[test]
fn contract_double_shutdown_dumps_once() {
    let lifecycle = VmLifecycle::new();
    let (mut vm, buffer) = bootstrap_with(RecordingHost::new(), dump_flags(), &lifecycle);
    vm.create_vm().unwrap();

    vm.run_shutdown();
    let after_first = buffer.contents();
    vm.run_shutdown();

    for action in [
        TeardownAction::PerfMemory,
        TeardownAction::SafepointStatistics,
        TeardownAction::SymbolTableStatistics,
        TeardownAction::StringTableStatistics,
    ] {
        assert_eq!(vm.host().teardown_count(action), 1);
    }
    assert_eq!(buffer.contents(), after_first);
}

/// Contract: shutdown works even if bootstrap never completed
#[test]
fn contract_shutdown_after_failed_bootstrap() {
    let lifecycle = VmLifecycle::new();
    let (mut vm, _) = bootstrap_with(
        RecordingHost::failing_at(StepId::Universe),
        RuntimeFlags::default(),
        &lifecycle,
    );
    assert!(vm.create_vm().is_err());

    vm.run_shutdown();
    assert_eq!(vm.host().teardown_count(TeardownAction::PerfMemory), 1);
    assert!(lifecycle.shutdown().is_latched());
}

proptest! {
    /// Law: injecting a failure at any fallible point returns Error and
    /// nothing after the failing step runs
    #[test]
    fn law_failure_injection_truncates(
        pick in 0usize..16,
        extra_failures in proptest::collection::vec(0usize..16, 0..3),
    ) {
        let fallible = fallible_primary_steps();
        let target = fallible[pick % fallible.len()];

        let mut host = RecordingHost::failing_at(target);
        for i in extra_failures {
            host.fail_at.insert(fallible[i % fallible.len()]);
        }

        let plan = BootPlan::standard();
        let first_failure = plan
            .primary()
            .steps()
            .iter()
            .position(|s| host.fail_at.contains(&s.id()))
            .unwrap();

        let lifecycle = VmLifecycle::new();
        let (mut vm, _) = bootstrap_with(host, RuntimeFlags::default(), &lifecycle);
        vm.run_phase1();
        prop_assert_eq!(vm.run_phase2(), StatusCode::Error);

        for (i, step) in plan.primary().steps().iter().enumerate() {
            let expected = usize::from(i <= first_failure);
            prop_assert_eq!(vm.host().count(step.id()), expected);
        }
        prop_assert!(!vm.is_completed());
    }

    /// Law: shutdown N >= 1 times is observably the same as once
    #[test]
    fn law_shutdown_idempotent(
        n in 1usize..12,
        safepoint in any::<bool>(),
        tables in any::<bool>(),
    ) {
        let flags = RuntimeFlags {
            print_safepoint_statistics: safepoint,
            print_string_table_statistics: tables,
            ..RuntimeFlags::default()
        };

        let once_lifecycle = VmLifecycle::new();
        let (mut once, once_out) = bootstrap_with(RecordingHost::new(), flags.clone(), &once_lifecycle);
        once.run_shutdown();

        let many_lifecycle = VmLifecycle::new();
        let (mut many, many_out) = bootstrap_with(RecordingHost::new(), flags, &many_lifecycle);
        for _ in 0..n {
            many.run_shutdown();
        }

        prop_assert_eq!(&once.host().teardowns, &many.host().teardowns);
        prop_assert_eq!(once_out.contents(), many_out.contents());
    }
}
