#[cfg(feature = "std")]
mod tests {
    use drogue_tcn75a::testutil::*;
    use drogue_tcn75a::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_time::{Duration, Instant};

    const PERIOD: Duration = Duration::from_millis(1000);

    fn config() -> PollerConfig {
        PollerConfig::default().with_period(PERIOD)
    }

    #[test]
    fn test_cycle_deadlines() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b11, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, config());
        let mut schedule = Schedule::new();

        poller.initialize_bank(&mut bus);
        bus.clear();
        assert_eq!(None, schedule.next_deadline());

        schedule.arm(clock.now());
        let next = schedule.poll(clock.now(), &mut poller, &mut bus);
        assert_eq!(Phase::Converting, poller.phase());
        assert_eq!(Some(Instant::from_millis(150)), next);
        assert_eq!(Some(Instant::from_millis(150)), schedule.pending_read_back());
        assert_eq!(Some(Instant::from_millis(1000)), schedule.next_cycle());
        assert_eq!(2, bus.triggers().len());
        assert!(bus.samples().is_empty());

        clock.advance_to(Instant::from_millis(150));
        let next = schedule.poll(clock.now(), &mut poller, &mut bus);
        assert_eq!(Phase::Idle, poller.phase());
        assert_eq!(Some(Instant::from_millis(1000)), next);
        assert_eq!(2, bus.samples().len());
    }

    #[test]
    fn test_early_poll_does_nothing() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b1, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, config());
        let mut schedule = Schedule::new();

        poller.initialize_bank(&mut bus);
        schedule.arm(Instant::from_millis(500));
        bus.clear();

        clock.advance(Duration::from_millis(499));
        let next = schedule.poll(clock.now(), &mut poller, &mut bus);
        assert_eq!(Some(Instant::from_millis(500)), next);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_read_back_never_precedes_latency() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b1011_0001, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, config());
        let latency = poller.config().latency();
        let mut schedule = Schedule::new();

        poller.initialize_bank(&mut bus);
        schedule.arm(clock.now());
        for _ in 0..40 {
            let next = schedule.poll(clock.now(), &mut poller, &mut bus).unwrap();
            clock.advance_to(next);
        }

        // 40 polls alternate trigger and read-back
        assert_eq!(20 * 4, bus.triggers().len());
        assert_eq!(20 * 4, bus.samples().len());
        for ((slot, triggered), (sampled_slot, sampled)) in
            bus.triggers().iter().zip(bus.samples().iter())
        {
            assert_eq!(slot, sampled_slot);
            assert!(*sampled - *triggered >= latency);
        }

        let starts: Vec<Instant> = bus
            .triggers()
            .iter()
            .filter(|(slot, _)| slot.index() == 0)
            .map(|(_, at)| *at)
            .collect();
        for pair in starts.windows(2) {
            assert_eq!(PERIOD, pair[1] - pair[0]);
        }
    }

    #[test]
    fn test_late_poll_catches_up() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b1, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, config());
        let mut schedule = Schedule::new();

        poller.initialize_bank(&mut bus);
        schedule.arm(clock.now());
        schedule.poll(clock.now(), &mut poller, &mut bus);

        // host was busy for several periods
        clock.advance_to(Instant::from_millis(3500));
        let next = schedule.poll(clock.now(), &mut poller, &mut bus);
        assert_eq!(Some(Instant::from_millis(3650)), next);
        assert_eq!(Some(Instant::from_millis(4500)), schedule.next_cycle());
    }

    #[test]
    fn test_disarm_lets_pending_read_back_fire() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b1, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, config());
        let mut schedule = Schedule::new();

        poller.initialize_bank(&mut bus);
        schedule.arm(clock.now());
        schedule.poll(clock.now(), &mut poller, &mut bus);
        assert_eq!(1, bus.triggers().len());

        schedule.disarm();
        assert!(!schedule.is_armed());
        assert_eq!(Some(Instant::from_millis(150)), schedule.next_deadline());

        clock.advance_to(Instant::from_millis(150));
        assert_eq!(None, schedule.poll(clock.now(), &mut poller, &mut bus));
        assert_eq!(1, bus.samples().len());

        clock.advance(Duration::from_secs(30));
        assert_eq!(None, schedule.poll(clock.now(), &mut poller, &mut bus));
        assert_eq!(1, bus.triggers().len());
        assert_eq!(1, bus.samples().len());
    }
}
