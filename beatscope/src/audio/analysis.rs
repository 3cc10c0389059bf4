// Hands windows of the mono mix from the audio thread to the UI thread.
// Buffers travel in a loop (writer -> tap -> writer) so the audio side
// never allocates.

use crossbeam_channel::{Receiver, Sender};

use crate::viz::{SignalTap, ANALYSIS_WINDOW};

const POOL_SIZE: usize = 4;

pub struct AnalysisWriter {
    filled_tx: Sender<Vec<f32>>,
    spare_rx: Receiver<Vec<f32>>,
    current: Option<Vec<f32>>,
}

pub struct AnalysisTap {
    filled_rx: Receiver<Vec<f32>>,
    spare_tx: Sender<Vec<f32>>,
    latest: Option<Vec<f32>>,
}

pub fn analysis_channel() -> (AnalysisWriter, AnalysisTap) {
    let (filled_tx, filled_rx) = crossbeam_channel::bounded(POOL_SIZE);
    let (spare_tx, spare_rx) = crossbeam_channel::bounded(POOL_SIZE + 1);
    for _ in 0..POOL_SIZE {
        let _ = spare_tx.try_send(Vec::with_capacity(ANALYSIS_WINDOW));
    }
    (
        AnalysisWriter { filled_tx, spare_rx, current: None },
        AnalysisTap { filled_rx, spare_tx, latest: None },
    )
}

impl AnalysisWriter {
    pub fn push(&mut self, sample: f32) {
        if self.current.is_none() {
            self.current = self.spare_rx.try_recv().ok();
        }
        // no spare buffer: the reader is behind, drop the sample
        let Some(buf) = self.current.as_mut() else {
            return;
        };
        buf.push(sample);
        if buf.len() >= ANALYSIS_WINDOW {
            if let Some(full) = self.current.take() {
                if let Err(err) = self.filled_tx.try_send(full) {
                    let mut back = err.into_inner();
                    back.clear();
                    self.current = Some(back);
                }
            }
        }
    }
}

impl SignalTap for AnalysisTap {
    fn sample_frame(&mut self) -> Option<&[f32]> {
        while let Ok(fresh) = self.filled_rx.try_recv() {
            if let Some(mut old) = self.latest.replace(fresh) {
                old.clear();
                let _ = self.spare_tx.try_send(old);
            }
        }
        self.latest.as_deref()
    }
}
