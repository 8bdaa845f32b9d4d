//! Contiguous zone detection over a boolean series
//!
//! A two-state scanner: inactive until the condition turns on, active until
//! it turns off. A zone is emitted when it closes and only if it is longer
//! than the minimum length. A zone still open when the input ends is
//! dropped.

/// A closed zone along the lap, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub start: f64,
    pub end: f64,
}

impl Zone {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    Inactive,
    Active { start: f64 },
}

/// Run-length scanner emitting zones where a condition holds.
#[derive(Debug, Clone)]
pub struct ZoneScanner {
    state: ScanState,
    min_length: f64,
    zones: Vec<Zone>,
}

impl ZoneScanner {
    /// Zones must be strictly longer than `min_length` to be kept.
    pub fn new(min_length: f64) -> Self {
        Self { state: ScanState::Inactive, min_length, zones: Vec::new() }
    }

    /// Feed the condition at the next position.
    pub fn push(&mut self, position: f64, active: bool) {
        match (self.state, active) {
            (ScanState::Inactive, true) => self.state = ScanState::Active { start: position },
            (ScanState::Active { start }, false) => {
                self.state = ScanState::Inactive;
                let zone = Zone { start, end: position };
                if zone.length() > self.min_length {
                    self.zones.push(zone);
                }
            }
            _ => {}
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ScanState::Active { .. })
    }

    /// Closed zones in scan order.
    pub fn finish(self) -> Vec<Zone> {
        self.zones
    }

    /// Scan a whole series at once.
    pub fn scan<I>(min_length: f64, series: I) -> Vec<Zone>
    where
        I: IntoIterator<Item = (f64, bool)>,
    {
        let mut scanner = Self::new(min_length);
        for (position, active) in series {
            scanner.push(position, active);
        }
        scanner.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_zones_on_close() {
        let series = [
            (0.0, false),
            (5.0, true),
            (10.0, true),
            (30.0, false),
            (40.0, true),
            (45.0, false),
            (60.0, true),
            (80.0, true),
        ];
        let zones = ZoneScanner::scan(10.0, series);
        assert_eq!(zones, vec![Zone { start: 5.0, end: 30.0 }]);
    }

    #[test]
    fn minimum_length_is_exclusive() {
        let flags = [(0.0, true), (10.0, false), (20.0, true), (30.5, false)];
        let zones = ZoneScanner::scan(10.0, flags);
        assert_eq!(zones, vec![Zone { start: 20.0, end: 30.5 }]);
    }

    #[test]
    fn open_zone_is_dropped() {
        let mut scanner = ZoneScanner::new(0.0);
        scanner.push(0.0, true);
        scanner.push(100.0, true);
        assert!(scanner.is_active());
        assert!(scanner.finish().is_empty());
    }
}
