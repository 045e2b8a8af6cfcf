use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, trace};
use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

enum Msg {
    Enqueue(Job),
    EnqueueAfter(Duration, Job),
    Cancel,
    Shutdown,
}

/// FIFO of outbound request closures, serviced by a dedicated tick thread.
///
/// While the queue is non-empty one closure fires per tick interval; the
/// first fires one interval after the queue becomes non-empty. When the
/// queue drains the ticking stops until the next enqueue. `enqueue_after`
/// parks a closure until its delay matures (the rate-limit retry path).
/// Cancel drops everything queued and parked; closures already running are
/// not interrupted.
pub struct Throttler {
    tx: Sender<Msg>,
    worker: Option<JoinHandle<()>>,
}

impl Throttler {
    pub const DEFAULT_TICK: Duration = Duration::from_millis(300);

    pub fn new(tick: Duration) -> Self {
        let (tx, rx) = unbounded();
        let worker = thread::spawn(move || tick_loop(rx, tick));
        Self {
            tx,
            worker: Some(worker),
        }
    }

    pub fn enqueue(&self, job: Job) {
        let _ = self.tx.send(Msg::Enqueue(job));
    }

    pub fn enqueue_after(&self, delay: Duration, job: Job) {
        let _ = self.tx.send(Msg::EnqueueAfter(delay, job));
    }

    /// Drops every queued and parked closure. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(Msg::Cancel);
    }
}

impl Default for Throttler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK)
    }
}

impl Drop for Throttler {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn tick_loop(rx: Receiver<Msg>, tick: Duration) {
    let mut queue: VecDeque<Job> = VecDeque::new();
    let mut parked: Vec<(Instant, Job)> = Vec::new();
    // Deadline of the next tick; None while the queue is empty.
    let mut next_tick: Option<Instant> = None;

    loop {
        let now = Instant::now();

        // Mature parked retries into the queue.
        let mut index = 0;
        while index < parked.len() {
            if parked[index].0 <= now {
                let (_, job) = parked.swap_remove(index);
                queue.push_back(job);
                if next_tick.is_none() {
                    next_tick = Some(now + tick);
                }
            } else {
                index += 1;
            }
        }

        if let Some(deadline) = next_tick {
            if queue.is_empty() {
                // The last closure was taken; ticking stops.
                trace!(target: "Throttler", "queue drained, tick stops");
                next_tick = None;
                continue;
            }
            if deadline <= now {
                let job = queue.pop_front().expect("checked non-empty");
                job();
                // A slow closure must not cause catch-up bursts.
                next_tick = Some(Instant::now() + tick);
                continue;
            }
        }

        let wakeup = [next_tick, parked.iter().map(|(at, _)| *at).min()]
            .into_iter()
            .flatten()
            .min();

        let msg = match wakeup {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(timeout) {
                    Ok(msg) => msg,
                    Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                    Err(crossbeam_channel::RecvTimeoutError::Disconnected) => return,
                }
            }
            None => match rx.recv() {
                Ok(msg) => msg,
                Err(_) => return,
            },
        };

        match msg {
            Msg::Enqueue(job) => {
                queue.push_back(job);
                if next_tick.is_none() {
                    next_tick = Some(Instant::now() + tick);
                }
            }
            Msg::EnqueueAfter(delay, job) => {
                debug!(target: "Throttler", "parking closure for {delay:?}");
                parked.push((Instant::now() + delay, job));
            }
            Msg::Cancel => {
                debug!(
                    target: "Throttler",
                    "cancel: dropping {} queued, {} parked",
                    queue.len(),
                    parked.len()
                );
                queue.clear();
                parked.clear();
                next_tick = None;
            }
            Msg::Shutdown => return,
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<Instant>>>, impl Fn() -> Job) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::clone(&fired);
        let make = move || -> Job {
            let fired = Arc::clone(&handle);
            Box::new(move || fired.lock().unwrap().push(Instant::now()))
        };
        (fired, make)
    }

    #[test]
    fn three_enqueued_closures__EXPECT__ith_fires_no_earlier_than_i_ticks() {
        // Given
        let tick = Duration::from_millis(50);
        let throttler = Throttler::new(tick);
        let (fired, make) = recorder();
        let start = Instant::now();

        // When
        for _ in 0..3 {
            throttler.enqueue(make());
        }
        std::thread::sleep(tick * 6);

        // Then
        let fired = fired.lock().unwrap();
        assert_eq!(3, fired.len());
        for (i, at) in fired.iter().enumerate() {
            let elapsed = at.duration_since(start);
            assert!(
                elapsed >= tick * (i as u32 + 1) - Duration::from_millis(5),
                "closure {i} fired after {elapsed:?}"
            );
        }
    }

    #[test]
    fn cancel_before_ticks__EXPECT__no_closure_fires() {
        // Given
        let throttler = Throttler::new(Duration::from_millis(50));
        let (fired, make) = recorder();

        // When
        for _ in 0..4 {
            throttler.enqueue(make());
        }
        throttler.cancel();
        std::thread::sleep(Duration::from_millis(300));

        // Then
        assert!(fired.lock().unwrap().is_empty());
    }

    #[test]
    fn cancel_twice__EXPECT__idempotent_and_queue_usable_again() {
        // Given
        let throttler = Throttler::new(Duration::from_millis(20));
        let (fired, make) = recorder();

        // When
        throttler.enqueue(make());
        throttler.cancel();
        throttler.cancel();
        throttler.enqueue(make());
        std::thread::sleep(Duration::from_millis(150));

        // Then
        assert_eq!(1, fired.lock().unwrap().len());
    }

    #[test]
    fn parked_closure__EXPECT__fires_only_after_its_delay() {
        // Given
        let throttler = Throttler::new(Duration::from_millis(10));
        let (fired, make) = recorder();
        let start = Instant::now();

        // When
        throttler.enqueue_after(Duration::from_millis(120), make());
        std::thread::sleep(Duration::from_millis(60));
        assert!(fired.lock().unwrap().is_empty());
        std::thread::sleep(Duration::from_millis(150));

        // Then
        let fired = fired.lock().unwrap();
        assert_eq!(1, fired.len());
        assert!(fired[0].duration_since(start) >= Duration::from_millis(120));
    }

    #[test]
    fn cancel__EXPECT__drops_parked_closures_too() {
        // Given
        let throttler = Throttler::new(Duration::from_millis(10));
        let (fired, make) = recorder();

        // When
        throttler.enqueue_after(Duration::from_millis(50), make());
        throttler.cancel();
        std::thread::sleep(Duration::from_millis(150));

        // Then
        assert!(fired.lock().unwrap().is_empty());
    }
}
