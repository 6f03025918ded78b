// frame.rs -- main loop timing

/// What the main loop should do this iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameStep {
    /// Not time for a server tic yet.
    Sleep,
    /// Run a host frame of this many seconds.
    Run(f64),
}

#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    oldtime: f64,
}

impl FrameClock {
    /// The first frame sees a tenth of a second.
    pub fn new(now: f64) -> Self {
        Self { oldtime: now - 0.1 }
    }

    pub fn oldtime(&self) -> f64 {
        self.oldtime
    }

    /// Work out the length of the next frame.
    ///
    /// Dedicated servers run fixed `ticrate` frames and sleep in between,
    /// unless a demo is being played back at full speed. A frame that took
    /// longer than two tics resynchronises the clock instead of trying to
    /// catch up.
    pub fn step(&mut self, now: f64, dedicated: bool, ticrate: f64, vcr_playback: bool) -> FrameStep {
        let mut time = now - self.oldtime;

        if dedicated {
            if time < ticrate && !vcr_playback {
                return FrameStep::Sleep;
            }
            time = ticrate;
        }

        if time > ticrate * 2.0 {
            self.oldtime = now;
        } else {
            self.oldtime += time;
        }

        FrameStep::Run(time)
    }
}
