// The musical clock. Repeating schedules are expressed in note values and
// resolved against the current tempo; the UI loop polls `advance` with the
// audio engine's clock so every tick carries the time it should sound at.

use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subdivision {
    Quarter,
    Eighth,
    Sixteenth,
}

impl Subdivision {
    pub fn seconds(self, bpm: f64) -> f64 {
        let beat = 60.0 / bpm;
        match self {
            Subdivision::Quarter => beat,
            Subdivision::Eighth => beat / 2.0,
            Subdivision::Sixteenth => beat / 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub handle: ScheduleHandle,
    pub time: f64,
    pub index: u64, // counts from 0 per schedule
}

pub trait Clock {
    fn now(&self) -> f64;
    fn bpm(&self) -> f64;
    fn schedule_repeating(&mut self, interval: Subdivision) -> ScheduleHandle;
    fn cancel(&mut self, handle: ScheduleHandle);
    fn set_tempo(&mut self, bpm: f64);
}

#[derive(Clone, Debug)]
struct Schedule {
    interval: Subdivision,
    next_time: f64,
    next_index: u64,
}

#[derive(Clone, Debug)]
pub struct Transport {
    now: f64,
    bpm: f64,
    next_handle: u64,
    schedules: BTreeMap<ScheduleHandle, Schedule>,
}

impl Transport {
    pub fn new(bpm: f64) -> Self {
        Self {
            now: 0.0,
            bpm,
            next_handle: 0,
            schedules: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn is_scheduled(&self, handle: ScheduleHandle) -> bool {
        self.schedules.contains_key(&handle)
    }

    // Move the clock to `now` and collect every tick due before
    // `now + lookahead`, earliest first. The clock never runs backwards.
    pub fn advance(&mut self, now: f64, lookahead: f64) -> Vec<Tick> {
        self.now = self.now.max(now);
        let horizon = self.now + lookahead;
        let mut ticks = Vec::new();
        for (&handle, sched) in self.schedules.iter_mut() {
            while sched.next_time < horizon {
                ticks.push(Tick {
                    handle,
                    time: sched.next_time,
                    index: sched.next_index,
                });
                sched.next_time += sched.interval.seconds(self.bpm);
                sched.next_index += 1;
            }
        }
        ticks.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.handle.cmp(&b.handle)));
        ticks
    }
}

impl Clock for Transport {
    fn now(&self) -> f64 {
        self.now
    }

    fn bpm(&self) -> f64 {
        self.bpm
    }

    fn schedule_repeating(&mut self, interval: Subdivision) -> ScheduleHandle {
        let handle = ScheduleHandle(self.next_handle);
        self.next_handle += 1;
        self.schedules.insert(handle, Schedule {
            interval,
            next_time: self.now,
            next_index: 0,
        });
        handle
    }

    fn cancel(&mut self, handle: ScheduleHandle) {
        self.schedules.remove(&handle);
    }

    fn set_tempo(&mut self, bpm: f64) {
        self.bpm = bpm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteenths_at_120_are_125ms() {
        assert!((Subdivision::Sixteenth.seconds(120.0) - 0.125).abs() < 1e-12);
        assert!((Subdivision::Quarter.seconds(60.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn first_tick_lands_on_schedule_time() {
        let mut t = Transport::new(120.0);
        t.advance(2.0, 0.0);
        let h = t.schedule_repeating(Subdivision::Sixteenth);
        let ticks = t.advance(2.0, 0.3);
        let times: Vec<f64> = ticks.iter().map(|t| t.time).collect();
        assert_eq!(times, vec![2.0, 2.125, 2.25]);
        assert!(ticks.iter().all(|t| t.handle == h));
        assert_eq!(ticks[2].index, 2);
    }

    #[test]
    fn ticks_are_not_repeated_across_polls() {
        let mut t = Transport::new(120.0);
        t.schedule_repeating(Subdivision::Sixteenth);
        let a = t.advance(0.0, 0.1);
        let b = t.advance(0.01, 0.1);
        let c = t.advance(0.2, 0.1);
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
        assert_eq!(c.iter().map(|t| t.index).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn interleaves_schedules_by_time() {
        let mut t = Transport::new(60.0);
        let quarter = t.schedule_repeating(Subdivision::Quarter);
        let eighth = t.schedule_repeating(Subdivision::Eighth);
        let ticks = t.advance(0.0, 1.2);
        let order: Vec<_> = ticks.iter().map(|t| (t.handle, t.time)).collect();
        assert_eq!(order, vec![
            (quarter, 0.0),
            (eighth, 0.0),
            (eighth, 0.5),
            (quarter, 1.0),
            (eighth, 1.0),
        ]);
    }

    #[test]
    fn cancel_stops_future_ticks() {
        let mut t = Transport::new(120.0);
        let h = t.schedule_repeating(Subdivision::Sixteenth);
        t.advance(0.0, 0.01);
        t.cancel(h);
        assert!(!t.is_scheduled(h));
        assert!(t.advance(1.0, 0.5).is_empty());
    }

    #[test]
    fn tempo_change_applies_to_following_intervals() {
        let mut t = Transport::new(120.0);
        t.schedule_repeating(Subdivision::Quarter);
        let first = t.advance(0.0, 0.1); // tick at 0.0, next at 0.5
        assert_eq!(first.len(), 1);
        t.set_tempo(60.0);
        let ticks = t.advance(0.5, 1.1);
        let times: Vec<f64> = ticks.iter().map(|t| t.time).collect();
        assert_eq!(times, vec![0.5, 1.5]);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut t = Transport::new(120.0);
        t.advance(3.0, 0.0);
        t.advance(1.0, 0.0);
        assert_eq!(t.now(), 3.0);
    }
}
