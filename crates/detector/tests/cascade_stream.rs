//! Replays a bar stream with a liquidation burst through the monitor

use bastion_core::{Bar, CascadePhase, Direction, LiquidationEvent, PositionSide};
use bastion_detector::{CascadeMonitor, DetectorConfig};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn ts(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 19, 14, 0, 0).unwrap() + Duration::minutes(minute)
}

fn bar(minute: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal, volume: Decimal) -> Bar {
    Bar::new("ETH-USD", ts(minute), open, high, low, close, volume)
}

#[test]
fn test_full_episode_emits_onset_exhaustion_and_idle() {
    let _ = env_logger::try_init();

    let config = DetectorConfig {
        liquidation_notional_threshold: dec!(500_000),
        ..Default::default()
    };
    let monitor = CascadeMonitor::new(config);

    // Quiet tape
    for minute in 0..20 {
        let open = dec!(3000);
        let close = if minute % 2 == 0 { dec!(3001) } else { dec!(2999) };
        assert!(
            monitor
                .on_bar(&bar(minute, open, dec!(3002), dec!(2998), close, dec!(50)))
                .is_none()
        );
    }

    monitor.on_liquidation(&LiquidationEvent {
        symbol: "ETH-USD".into(),
        side: PositionSide::Long,
        size: dec!(400),
        price: dec!(2950),
        leverage: dec!(25),
        exchange: "bybit".into(),
        timestamp: ts(20),
    });

    let mut events = Vec::new();
    // Long squeeze down, then a fading follow-through and a calm bar
    let tape = [
        bar(20, dec!(2999), dec!(3000), dec!(2900), dec!(2910), dec!(400)),
        bar(21, dec!(2910), dec!(2915), dec!(2880), dec!(2900), dec!(150)),
        bar(22, dec!(2900), dec!(2905), dec!(2895), dec!(2896), dec!(60)),
    ];
    for b in &tape {
        events.extend(monitor.on_bar(b));
    }

    let phases: Vec<_> = events.iter().map(|e| e.phase).collect();
    assert_eq!(
        phases,
        vec![CascadePhase::Active, CascadePhase::Exhausting, CascadePhase::Idle]
    );

    let onset = &events[0];
    assert!(onset.is_onset());
    assert_eq!(onset.direction, Direction::Bearish);
    assert!(onset.metrics.volume_climax);
    assert_eq!(onset.metrics.long_liquidations, dec!(1_180_000));
    assert_eq!(onset.confidence, Decimal::ONE);

    assert!(events.iter().all(|e| e.started_at == Some(ts(20))));
    assert!(monitor.state("ETH-USD").unwrap().started_at.is_none());
}
