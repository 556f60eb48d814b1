#[cfg(feature = "std")]
mod tests {
    use drogue_tcn75a::testutil::*;
    use drogue_tcn75a::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_time::Duration;

    fn slot(index: u8) -> SlotId {
        SlotId::new(index).unwrap()
    }

    fn assert_waited_for_conversion(bus: &TestBus, latency: Duration) {
        for (id, triggered) in bus.triggers() {
            let sampled = bus
                .samples()
                .iter()
                .find(|(s, at)| s == id && at >= triggered)
                .map(|(_, at)| *at);
            if let Some(sampled) = sampled {
                assert!(
                    sampled - *triggered >= latency,
                    "slot {} read {} us after trigger",
                    id.index(),
                    (sampled - *triggered).as_micros()
                );
            }
        }
    }

    #[test]
    fn test_latency_follows_resolution() {
        let config = PollerConfig::default();
        assert_eq!(Duration::from_millis(150), config.latency());
        assert_eq!(Duration::from_secs(10), config.period());

        let short = config.with_period(Duration::from_millis(100));
        assert_eq!(Duration::from_millis(300), short.period());
    }

    #[test]
    fn test_first_cycle_blocks_for_latency() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b0000_0011, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, PollerConfig::default());
        let mut delay = TestDelay::new(clock.clone());

        poller.initialize_bank(&mut bus);
        bus.set_temperature(slot(0), 0x1540);
        bus.set_temperature(slot(1), 0x9980);
        poller.start(&mut bus, &mut delay);

        assert_eq!(&[Duration::from_millis(150)], delay.requested());
        assert_eq!(Phase::Idle, poller.phase());
        assert_eq!(2, bus.triggers().len());
        assert_eq!(2, bus.samples().len());
        assert_waited_for_conversion(&bus, poller.config().latency());

        let readings = poller.readings();
        assert_eq!(0x1540, readings.raw[0]);
        assert_eq!(0x9980, readings.raw[1]);
        let temperatures: Vec<f32> = readings
            .temperatures()
            .map(|(_, t)| t.raw_value())
            .collect();
        assert_eq!(vec![21.25, -25.5], temperatures);
    }

    #[test]
    fn test_reading_early_returns_stale_value() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b1, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, PollerConfig::default());

        poller.initialize_bank(&mut bus);
        poller.start(&mut bus, &mut TestDelay::new(clock.clone()));
        assert_eq!(0x1980, poller.readings().raw[0]);

        bus.set_temperature(slot(0), 0x1A00);
        poller.trigger(&mut bus);
        clock.advance(Duration::from_millis(50));
        poller.read_back(&mut bus);
        assert_eq!(0x1980, poller.readings().raw[0]);
    }

    #[test]
    fn test_phases() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock, 0b1, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, PollerConfig::default());

        poller.initialize_bank(&mut bus);
        assert_eq!(Phase::Idle, poller.phase());
        poller.trigger(&mut bus);
        assert_eq!(Phase::Converting, poller.phase());
        assert!(poller.read_back(&mut bus));
        assert_eq!(Phase::Idle, poller.phase());
    }

    #[test]
    fn test_read_back_requires_trigger() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock, 0b1, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, PollerConfig::default());

        poller.initialize_bank(&mut bus);
        bus.clear();
        assert!(!poller.read_back(&mut bus));
        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_read_failure_is_isolated() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b0000_0111, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, PollerConfig::default());
        let mut delay = TestDelay::new(clock);

        poller.initialize_bank(&mut bus);
        poller.start(&mut bus, &mut delay);
        assert_eq!([0x1980; 3], poller.readings().raw[..3]);

        bus.set_temperature(slot(0), 0x1500);
        bus.set_temperature(slot(2), 0x1600);
        bus.fail(slot(1), Stage::ReadAddress);
        bus.clear();
        poller.start(&mut bus, &mut delay);

        assert_eq!(3, bus.triggers().len());
        assert_eq!(2, bus.samples().len());
        let readings = poller.readings();
        assert_eq!(0x1500, readings.raw[0]);
        assert_eq!(0x1981, readings.raw[1]);
        assert_eq!(0x1600, readings.raw[2]);
        assert!(!registry.slot(slot(1)).valid);
        assert_eq!(2, readings.temperatures().count());
    }

    #[test]
    fn test_invalid_marker_accumulates_and_clears() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b1, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, PollerConfig::default());
        let mut delay = TestDelay::new(clock);

        poller.initialize_bank(&mut bus);
        poller.start(&mut bus, &mut delay);

        bus.fail(slot(0), Stage::Address);
        poller.start(&mut bus, &mut delay);
        poller.start(&mut bus, &mut delay);
        assert_eq!(0x1981, poller.readings().raw[0]);
        assert!(poller.readings().raw(slot(0)).is_marked_invalid());
        // a failing slot stays present
        assert_eq!(0b1, poller.readings().present);

        bus.heal(slot(0));
        bus.set_temperature(slot(0), 0x1A80);
        poller.start(&mut bus, &mut delay);
        assert_eq!(0x1A80, poller.readings().raw[0]);
        assert!(registry.slot(slot(0)).valid);
    }

    #[test]
    fn test_trigger_failure_does_not_block_cycle() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b0000_0011, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, PollerConfig::default());
        let mut delay = TestDelay::new(clock);

        poller.initialize_bank(&mut bus);
        poller.start(&mut bus, &mut delay);

        bus.set_temperature(slot(0), 0x1A00);
        bus.set_temperature(slot(1), 0x1B00);
        bus.fail(slot(0), Stage::Data);
        bus.clear();
        poller.start(&mut bus, &mut delay);

        // slot 0 refused the trigger but was still read back, keeping its old value
        assert_eq!(1, bus.triggers().len());
        assert_eq!(2, bus.samples().len());
        let readings = poller.readings();
        assert_eq!(0x1980, readings.raw[0]);
        assert_eq!(0x1B00, readings.raw[1]);
        assert!(registry.slot(slot(0)).valid);
    }

    #[test]
    fn test_triggers_precede_read_back_in_slot_order() {
        let clock = VirtualClock::new();
        let mut bus = TestBus::with_chips(clock.clone(), 0b1100_0101, 0x1980);
        let registry = Registry::<NoopRawMutex>::new();
        let mut poller = Poller::new(&registry, PollerConfig::default());

        poller.initialize_bank(&mut bus);
        bus.clear();
        poller.start(&mut bus, &mut TestDelay::new(clock));

        let order: Vec<(u8, bool)> = bus
            .transactions()
            .iter()
            .map(|t| (t.address, t.read))
            .collect();
        assert_eq!(
            vec![
                (0x48, false),
                (0x4A, false),
                (0x4E, false),
                (0x4F, false),
                (0x48, false),
                (0x48, true),
                (0x4A, false),
                (0x4A, true),
                (0x4E, false),
                (0x4E, true),
                (0x4F, false),
                (0x4F, true),
            ],
            order
        );
    }
}
