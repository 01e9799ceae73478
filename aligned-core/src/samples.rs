//! Multi-channel samples aligned to one timestamp sequence.

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("timestamp sequence is empty")]
    EmptyTimes,
    #[error("timestamps are not strictly increasing at index {index}")]
    NotIncreasing { index: usize },
    #[error("{values} values cannot be split into channels of {samples} samples")]
    RaggedPayload { values: usize, samples: usize },
    #[error("timestamp {index} is not a finite number")]
    NonFiniteTime { index: usize },
    #[error("channel {channel} sample {index} is not a finite number")]
    NonFiniteValue { channel: usize, index: usize },
    #[error("channel {channel} has {len} samples, expected {expected}")]
    ChannelLength {
        channel: usize,
        len: usize,
        expected: usize,
    },
}

/// Immutable once built. Channel `k` holds one value per timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    times: Vec<f64>,
    channels: Vec<Vec<f64>>,
}

impl SampleBuffer {
    /// Splits a flat payload into channels of `times.len()` samples each.
    ///
    /// A payload whose length is not a multiple of the timestamp count is
    /// rejected with [`SampleError::RaggedPayload`] instead of being truncated.
    /// NaN and infinite samples are rejected too; they have no JSON form.
    pub fn new(times: Vec<f64>, payload: Vec<f64>) -> Result<Self, SampleError> {
        check_times(&times)?;
        let samples = times.len();
        if payload.len() % samples != 0 {
            return Err(SampleError::RaggedPayload {
                values: payload.len(),
                samples,
            });
        }
        let channels: Vec<Vec<f64>> = payload
            .chunks_exact(samples)
            .map(|chunk| chunk.to_vec())
            .collect();
        check_values(&channels)?;
        Ok(Self { times, channels })
    }

    pub fn from_channels(times: Vec<f64>, channels: Vec<Vec<f64>>) -> Result<Self, SampleError> {
        check_times(&times)?;
        for (channel, values) in channels.iter().enumerate() {
            if values.len() != times.len() {
                return Err(SampleError::ChannelLength {
                    channel,
                    len: values.len(),
                    expected: times.len(),
                });
            }
        }
        check_values(&channels)?;
        Ok(Self { times, channels })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f64]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Timestamp of the last sample.
    pub fn duration(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

fn check_times(times: &[f64]) -> Result<(), SampleError> {
    if times.is_empty() {
        return Err(SampleError::EmptyTimes);
    }
    for (index, pair) in times.windows(2).enumerate() {
        if !(pair[1] > pair[0]) {
            return Err(SampleError::NotIncreasing { index: index + 1 });
        }
    }
    if let Some(index) = times.iter().position(|t| !t.is_finite()) {
        return Err(SampleError::NonFiniteTime { index });
    }
    Ok(())
}

fn check_values(channels: &[Vec<f64>]) -> Result<(), SampleError> {
    for (channel, values) in channels.iter().enumerate() {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(SampleError::NonFiniteValue { channel, index });
        }
    }
    Ok(())
}
