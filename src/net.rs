//! Fixed-topology MLP: input → Linear+ReLU → Linear+ReLU → Linear.
//!
//! Everything is scalar loops over flat row-major `Vec<f32>` matrices.
//! Weight files are little-endian:
//!
//! ```text
//! i32 magic (0x4D4C5031, "MLP1") | i32 version (1)
//! i32 input | i32 hidden1 | i32 hidden2 | i32 output
//! f32 W1[hidden1 * input]  f32 b1[hidden1]
//! f32 W2[hidden2 * hidden1] f32 b2[hidden2]
//! f32 W3[output * hidden2]  f32 b3[output]
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use rand::Rng;

use crate::error::{Error, Result};
use crate::replay_buffer::Batch;

pub const FILE_MAGIC: i32 = 0x4D4C_5031;
pub const FORMAT_VERSION: i32 = 1;
const HEADER_BYTES: usize = 6 * 4;

/// Layer sizes of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub input: usize,
    pub hidden1: usize,
    pub hidden2: usize,
    pub output: usize,
}

impl Shape {
    pub fn new(input: usize, hidden1: usize, hidden2: usize, output: usize) -> Self {
        Self { input, hidden1, hidden2, output }
    }

    /// Number of floats in each parameter array, in file order.
    fn param_lens(&self) -> [usize; 6] {
        [
            self.hidden1 * self.input,
            self.hidden1,
            self.hidden2 * self.hidden1,
            self.hidden2,
            self.output * self.hidden2,
            self.output,
        ]
    }

    pub fn param_count(&self) -> usize {
        self.param_lens().iter().sum()
    }

    /// Parameter bytes on disk, `None` if the size does not fit in a `u64`.
    fn checked_payload_bytes(&self) -> Option<u64> {
        let [i, h1, h2, o] = [self.input, self.hidden1, self.hidden2, self.output].map(|d| d as u64);
        let w1 = h1.checked_mul(i)?;
        let w2 = h2.checked_mul(h1)?;
        let w3 = o.checked_mul(h2)?;
        [w1, h1, w2, h2, w3, o]
            .into_iter()
            .try_fold(0u64, |acc, n| acc.checked_add(n))?
            .checked_mul(4)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}-{}", self.input, self.hidden1, self.hidden2, self.output)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNet {
    shape: Shape,
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
    w3: Vec<f32>,
    b3: Vec<f32>,
}

/// Per-layer outputs of one forward pass, kept for backprop.
struct Activations {
    a1: Vec<f32>,
    a2: Vec<f32>,
    q: Vec<f32>,
}

/// Gradient buffers with the same layout as the parameters.
struct Gradients {
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
    w3: Vec<f32>,
    b3: Vec<f32>,
}

impl Gradients {
    fn zeros(shape: Shape) -> Self {
        let [w1, b1, w2, b2, w3, b3] = shape.param_lens().map(|n| vec![0.0f32; n]);
        Self { w1, b1, w2, b2, w3, b3 }
    }

    fn scale(&mut self, k: f32) {
        for g in [&mut self.w1, &mut self.b1, &mut self.w2, &mut self.b2, &mut self.w3, &mut self.b3] {
            g.iter_mut().for_each(|v| *v *= k);
        }
    }
}

impl NeuralNet {
    /// New network with uniform He init (`limit = sqrt(6 / fan_in)`) and
    /// zero biases.
    pub fn new<R: Rng + ?Sized>(input: usize, hidden1: usize, hidden2: usize, output: usize, rng: &mut R) -> Self {
        let shape = Shape::new(input, hidden1, hidden2, output);
        debug_assert!(input > 0 && hidden1 > 0 && hidden2 > 0 && output > 0, "empty layer in {shape}");
        Self {
            shape,
            w1: he_uniform(hidden1 * input, input, rng),
            b1: vec![0.0; hidden1],
            w2: he_uniform(hidden2 * hidden1, hidden1, rng),
            b2: vec![0.0; hidden2],
            w3: he_uniform(output * hidden2, hidden2, rng),
            b3: vec![0.0; output],
        }
    }

    fn zeros(shape: Shape) -> Self {
        let [w1, b1, w2, b2, w3, b3] = shape.param_lens().map(|n| vec![0.0f32; n]);
        Self { shape, w1, b1, w2, b2, w3, b3 }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn param_count(&self) -> usize {
        self.shape.param_count()
    }

    /// Q-values for `state`.
    pub fn predict(&self, state: &[f32]) -> Result<Vec<f32>> {
        self.check_state(state)?;
        Ok(self.forward(state).q)
    }

    /// One SGD step on `0.5 * (q[action] - target)^2`. Only the chosen
    /// action's output receives gradient. Returns the loss before the step.
    pub fn backward_and_step(&mut self, state: &[f32], action: usize, target: f32, learning_rate: f32) -> Result<f32> {
        self.check_state(state)?;
        self.check_action(action)?;

        let mut grads = Gradients::zeros(self.shape);
        let err = self.accumulate(state, action, target, &mut grads);
        self.apply(&grads, learning_rate);
        Ok(0.5 * err * err)
    }

    /// Same masked loss summed over the batch, followed by a single descent
    /// step. With `average` the summed gradient is divided by the batch size.
    /// Returns the mean loss before the step.
    ///
    /// Every sample is validated first; on error nothing is updated.
    pub fn backward_and_step_batch(&mut self, batch: &Batch<'_>, targets: &[f32], learning_rate: f32, average: bool) -> Result<f32> {
        if targets.len() != batch.len() {
            return Err(Error::InvalidInput { expected: batch.len(), got: targets.len() });
        }
        for t in batch.iter() {
            self.check_state(&t.state)?;
            self.check_action(t.action)?;
        }
        if batch.is_empty() {
            return Ok(0.0);
        }

        let mut grads = Gradients::zeros(self.shape);
        let mut loss = 0.0f32;
        for (t, &target) in batch.iter().zip(targets) {
            let err = self.accumulate(&t.state, t.action, target, &mut grads);
            loss += 0.5 * err * err;
        }
        if average {
            grads.scale(1.0 / batch.len() as f32);
        }
        self.apply(&grads, learning_rate);
        Ok(loss / batch.len() as f32)
    }

    /// Deep copy of every parameter from `other`.
    pub fn copy_weights_from(&mut self, other: &NeuralNet) -> Result<()> {
        if other.shape != self.shape {
            return Err(Error::ArchitectureMismatch { expected: self.shape, found: other.shape });
        }
        self.w1.copy_from_slice(&other.w1);
        self.b1.copy_from_slice(&other.b1);
        self.w2.copy_from_slice(&other.w2);
        self.b2.copy_from_slice(&other.b2);
        self.w3.copy_from_slice(&other.w3);
        self.b3.copy_from_slice(&other.b3);
        Ok(())
    }

    pub fn has_non_finite(&self) -> bool {
        self.params().iter().any(|p| crate::utils::has_non_finite(p))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        let s = self.shape;
        for v in [FILE_MAGIC, FORMAT_VERSION] {
            w.write_all(&v.to_le_bytes())?;
        }
        for dim in [s.input, s.hidden1, s.hidden2, s.output] {
            let dim = i32::try_from(dim).map_err(|_| Error::Format(format!("layer size {dim} does not fit in i32")))?;
            w.write_all(&dim.to_le_bytes())?;
        }
        for p in self.params() {
            for v in p {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        w.flush()?;
        Ok(())
    }

    /// Replaces all parameters with the ones stored at `path`. The stored
    /// dimensions must equal this network's; nothing changes on error.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let loaded = read_weight_file(path.as_ref(), Some(self.shape))?;
        *self = loaded;
        Ok(())
    }

    /// Builds a network with whatever dimensions the file declares.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_weight_file(path.as_ref(), None)
    }

    fn params(&self) -> [&Vec<f32>; 6] {
        [&self.w1, &self.b1, &self.w2, &self.b2, &self.w3, &self.b3]
    }

    fn params_mut(&mut self) -> [&mut Vec<f32>; 6] {
        [&mut self.w1, &mut self.b1, &mut self.w2, &mut self.b2, &mut self.w3, &mut self.b3]
    }

    fn check_state(&self, state: &[f32]) -> Result<()> {
        if state.len() != self.shape.input {
            return Err(Error::InvalidInput { expected: self.shape.input, got: state.len() });
        }
        Ok(())
    }

    fn check_action(&self, action: usize) -> Result<()> {
        if action >= self.shape.output {
            return Err(Error::ActionOutOfRange { action, actions: self.shape.output });
        }
        Ok(())
    }

    fn forward(&self, x: &[f32]) -> Activations {
        let s = self.shape;
        let mut a1 = vec![0.0f32; s.hidden1];
        let mut a2 = vec![0.0f32; s.hidden2];
        let mut q = vec![0.0f32; s.output];

        linear(&self.w1, s.input, x, &self.b1, &mut a1);
        relu(&mut a1);
        linear(&self.w2, s.hidden1, &a1, &self.b2, &mut a2);
        relu(&mut a2);
        linear(&self.w3, s.hidden2, &a2, &self.b3, &mut q);

        Activations { a1, a2, q }
    }

    /// Adds the gradient of one sample into `grads`, returns `q[action] - target`.
    fn accumulate(&self, x: &[f32], action: usize, target: f32, grads: &mut Gradients) -> f32 {
        let s = self.shape;
        let Activations { a1, a2, q } = self.forward(x);

        // dL/dq: zero everywhere except the action taken
        let mut d_q = vec![0.0f32; s.output];
        let err = q[action] - target;
        d_q[action] = err;

        // output layer (linear)
        let mut d_a2 = linear_backward(&self.w3, s.hidden2, &a2, &d_q, &mut grads.w3, &mut grads.b3);
        // hidden2 (relu)
        relu_backward(&a2, &mut d_a2);
        let mut d_a1 = linear_backward(&self.w2, s.hidden1, &a1, &d_a2, &mut grads.w2, &mut grads.b2);
        // hidden1 (relu); gradient w.r.t. the input is not needed
        relu_backward(&a1, &mut d_a1);
        linear_backward(&self.w1, s.input, x, &d_a1, &mut grads.w1, &mut grads.b1);

        err
    }

    /// Plain SGD: `p -= lr * g`.
    fn apply(&mut self, grads: &Gradients, lr: f32) {
        let gs = [&grads.w1, &grads.b1, &grads.w2, &grads.b2, &grads.w3, &grads.b3];
        for (p, g) in self.params_mut().into_iter().zip(gs) {
            for (pv, gv) in p.iter_mut().zip(g.iter()) {
                *pv -= lr * gv;
            }
        }
    }
}

fn he_uniform<R: Rng + ?Sized>(len: usize, fan_in: usize, rng: &mut R) -> Vec<f32> {
    let limit = (6.0 / fan_in as f64).sqrt() as f32;
    (0..len).map(|_| rng.gen_range(-limit..=limit)).collect()
}

/// `y = W x + b` for a row-major `W` with `cols` columns.
fn linear(w: &[f32], cols: usize, x: &[f32], b: &[f32], y: &mut [f32]) {
    for (r, row) in w.chunks_exact(cols).enumerate() {
        let mut sum = b[r];
        for (wv, xv) in row.iter().zip(x) {
            sum += wv * xv;
        }
        y[r] = sum;
    }
}

fn relu(v: &mut [f32]) {
    for x in v.iter_mut() {
        if *x < 0.0 {
            *x = 0.0;
        }
    }
}

/// Zeroes the gradient wherever the activation was not positive.
fn relu_backward(activation: &[f32], grad: &mut [f32]) {
    for (g, &a) in grad.iter_mut().zip(activation) {
        if a <= 0.0 {
            *g = 0.0;
        }
    }
}

/// Accumulates `dW += d_out ⊗ input`, `db += d_out` and returns `Wᵀ d_out`.
fn linear_backward(w: &[f32], cols: usize, input: &[f32], d_out: &[f32], dw: &mut [f32], db: &mut [f32]) -> Vec<f32> {
    let mut d_in = vec![0.0f32; cols];
    for (r, &g) in d_out.iter().enumerate() {
        if g == 0.0 {
            continue;
        }
        db[r] += g;
        let off = r * cols;
        for c in 0..cols {
            dw[off + c] += g * input[c];
            d_in[c] += g * w[off + c];
        }
    }
    d_in
}

fn read_weight_file(path: &Path, expected: Option<Shape>) -> Result<NeuralNet> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);

    let mut header = [0u8; HEADER_BYTES];
    read_or_truncated(&mut r, &mut header, "header")?;
    let field = |i: usize| i32::from_le_bytes([header[i * 4], header[i * 4 + 1], header[i * 4 + 2], header[i * 4 + 3]]);

    let magic = field(0);
    if magic != FILE_MAGIC {
        return Err(Error::Format(format!("bad magic 0x{magic:08X}, expected 0x{FILE_MAGIC:08X}")));
    }
    let version = field(1);
    if version != FORMAT_VERSION {
        return Err(Error::Format(format!("unsupported version {version}")));
    }

    let mut dims = [0usize; 4];
    for (i, d) in dims.iter_mut().enumerate() {
        let v = field(2 + i);
        *d = usize::try_from(v)
            .ok()
            .filter(|&d| d > 0)
            .ok_or_else(|| Error::Format(format!("invalid layer size {v}")))?;
    }
    let shape = Shape::new(dims[0], dims[1], dims[2], dims[3]);
    if let Some(expected) = expected {
        if shape != expected {
            return Err(Error::ArchitectureMismatch { expected, found: shape });
        }
    }

    // size check before anything is allocated for the declared shape
    let available = file_len.saturating_sub(HEADER_BYTES as u64);
    let payload = shape
        .checked_payload_bytes()
        .ok_or_else(|| Error::Format(format!("layer sizes {shape} are too large")))?;
    if available < payload {
        return Err(Error::Format(format!(
            "file holds {available} bytes of parameters, {shape} needs {payload}"
        )));
    }

    let mut net = NeuralNet::zeros(shape);
    let mut buf = [0u8; 4];
    for p in net.params_mut() {
        for v in p.iter_mut() {
            read_or_truncated(&mut r, &mut buf, "parameters")?;
            *v = f32::from_le_bytes(buf);
        }
    }
    Ok(net)
}

fn read_or_truncated<R: Read>(r: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::Format(format!("file truncated while reading {what}")),
        _ => Error::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay_buffer::ReplayBuffer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    fn small_net(seed: u64) -> NeuralNet {
        NeuralNet::new(6, 8, 5, 3, &mut StdRng::seed_from_u64(seed))
    }

    fn sample_input() -> Vec<f32> {
        vec![0.3, -1.2, 0.8, 0.0, 1.0, 0.5]
    }

    #[test]
    fn he_init_respects_limits_and_zero_biases() {
        let net = NeuralNet::new(406, 128, 64, 3, &mut StdRng::seed_from_u64(1));
        let lim1 = (6.0f32 / 406.0).sqrt();
        let lim2 = (6.0f32 / 128.0).sqrt();
        let lim3 = (6.0f32 / 64.0).sqrt();
        assert!(net.w1.iter().all(|w| w.abs() <= lim1 + 1e-6));
        assert!(net.w2.iter().all(|w| w.abs() <= lim2 + 1e-6));
        assert!(net.w3.iter().all(|w| w.abs() <= lim3 + 1e-6));
        assert!(net.b1.iter().chain(&net.b2).chain(&net.b3).all(|&b| b == 0.0));
        assert_eq!(net.w1.len(), 128 * 406);
        assert_eq!(net.param_count(), 128 * 406 + 128 + 64 * 128 + 64 + 3 * 64 + 3);
        // not all identical
        assert!(net.w1.iter().any(|&w| w != net.w1[0]));
    }

    #[test]
    fn forward_matches_hand_computation() {
        let mut net = NeuralNet::zeros(Shape::new(2, 2, 1, 2));
        net.w1 = vec![1.0, -1.0, 0.5, 0.5];
        net.b1 = vec![0.0, 1.0];
        net.w2 = vec![2.0, 1.0];
        net.b2 = vec![-1.0];
        net.w3 = vec![1.0, -3.0];
        net.b3 = vec![0.5, 0.0];

        // a1 = relu([1 - 2, 0.5 + 1 + 1]) = [0, 2.5]; a2 = relu(2.5 - 1) = 1.5
        let q = net.predict(&[1.0, 2.0]).unwrap();
        assert_eq!(q, vec![2.0, -4.5]);
    }

    #[test]
    fn predict_rejects_wrong_length() {
        let net = small_net(1);
        assert!(matches!(net.predict(&[0.0; 5]), Err(Error::InvalidInput { expected: 6, got: 5 })));
        assert!(matches!(net.predict(&[0.0; 7]), Err(Error::InvalidInput { expected: 6, got: 7 })));
    }

    #[test]
    fn single_step_moves_selected_output_toward_target() {
        let mut net = small_net(2);
        let x = sample_input();
        let before = net.predict(&x).unwrap();
        let target = before[1] + 1.0;
        for _ in 0..50 {
            net.backward_and_step(&x, 1, target, 0.01).unwrap();
        }
        let after = net.predict(&x).unwrap();
        assert!((after[1] - target).abs() < (before[1] - target).abs());
    }

    #[test]
    fn only_selected_output_row_changes() {
        let mut net = small_net(3);
        let w3_before = net.w3.clone();
        let b3_before = net.b3.clone();
        net.backward_and_step(&sample_input(), 2, 10.0, 0.05).unwrap();
        let h2 = net.shape.hidden2;
        assert_eq!(&net.w3[..2 * h2], &w3_before[..2 * h2]);
        assert_eq!(&net.b3[..2], &b3_before[..2]);
        assert_ne!(net.b3[2], b3_before[2]);
    }

    #[test]
    fn dead_relu_blocks_gradient() {
        let mut net = NeuralNet::zeros(Shape::new(1, 1, 1, 1));
        net.w1 = vec![-1.0];
        net.w2 = vec![1.0];
        net.w3 = vec![1.0];
        net.b3 = vec![0.0];
        // pre-activation of the first layer is -1, so only b3 can move
        net.backward_and_step(&[1.0], 0, 1.0, 0.5).unwrap();
        assert_eq!(net.w1, vec![-1.0]);
        assert_eq!(net.b1, vec![0.0]);
        assert_eq!(net.w2, vec![1.0]);
        assert_eq!(net.w3, vec![1.0]);
        assert_eq!(net.b3, vec![0.5]);
    }

    #[test]
    fn bad_action_is_rejected_without_update() {
        let mut net = small_net(4);
        let copy = net.clone();
        assert!(matches!(
            net.backward_and_step(&sample_input(), 3, 0.0, 0.1),
            Err(Error::ActionOutOfRange { action: 3, actions: 3 })
        ));
        assert_eq!(net, copy);
    }

    #[test]
    fn batch_of_one_matches_single_step() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut buffer = ReplayBuffer::new(4);
        buffer.add(&sample_input(), 1, 0.5, &sample_input(), false);

        let mut single = small_net(5);
        let mut batched = single.clone();
        single.backward_and_step(&sample_input(), 1, 0.7, 0.02).unwrap();
        let batch = buffer.sample(1, &mut rng).unwrap();
        batched.backward_and_step_batch(&batch, &[0.7], 0.02, true).unwrap();
        assert_eq!(single, batched);
    }

    #[test]
    fn averaging_divides_summed_gradient() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut buffer = ReplayBuffer::new(4);
        buffer.add(&sample_input(), 0, 0.0, &sample_input(), false);
        let batch = buffer.sample(4, &mut rng).unwrap();
        let targets = [1.0; 4];

        // four copies of one sample: summed = 4x single gradient, averaged = 1x
        let base = small_net(6);
        let mut summed = base.clone();
        summed.backward_and_step_batch(&batch, &targets, 0.01, false).unwrap();
        let mut averaged = base.clone();
        averaged.backward_and_step_batch(&batch, &targets, 0.01, true).unwrap();
        let mut single = base.clone();
        single.backward_and_step(&sample_input(), 0, 1.0, 0.01).unwrap();

        let d_sum = summed.b3[0] - base.b3[0];
        let d_avg = averaged.b3[0] - base.b3[0];
        let d_one = single.b3[0] - base.b3[0];
        assert!((d_sum - 4.0 * d_one).abs() < 1e-5);
        assert!((d_avg - d_one).abs() < 1e-6);
    }

    #[test]
    fn batch_validation_happens_before_update() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut buffer = ReplayBuffer::new(4);
        buffer.add(&sample_input(), 0, 0.0, &sample_input(), false);
        let batch = buffer.sample(2, &mut rng).unwrap();

        let mut net = small_net(7);
        let copy = net.clone();
        assert!(matches!(
            net.backward_and_step_batch(&batch, &[1.0], 0.1, true),
            Err(Error::InvalidInput { expected: 2, got: 1 })
        ));

        let mut wrong = ReplayBuffer::new(2);
        wrong.add(&[0.0; 4], 0, 0.0, &[0.0; 4], true);
        let bad = wrong.sample(1, &mut rng).unwrap();
        assert!(matches!(net.backward_and_step_batch(&bad, &[1.0], 0.1, true), Err(Error::InvalidInput { .. })));
        assert_eq!(net, copy);
    }

    #[test]
    fn copy_is_deep() {
        let mut online = small_net(10);
        let mut target = small_net(11);
        target.copy_weights_from(&online).unwrap();
        assert_eq!(online.predict(&sample_input()).unwrap(), target.predict(&sample_input()).unwrap());

        online.backward_and_step(&sample_input(), 0, 5.0, 0.1).unwrap();
        assert_ne!(online.predict(&sample_input()).unwrap(), target.predict(&sample_input()).unwrap());
        let mut fresh = small_net(12);
        fresh.copy_weights_from(&target).unwrap();
        assert_eq!(fresh.predict(&sample_input()).unwrap(), target.predict(&sample_input()).unwrap());
    }

    #[test]
    fn copy_rejects_other_shape() {
        let mut a = small_net(1);
        let b = NeuralNet::new(6, 8, 4, 3, &mut StdRng::seed_from_u64(1));
        let before = a.clone();
        assert!(matches!(a.copy_weights_from(&b), Err(Error::ArchitectureMismatch { .. })));
        assert_eq!(a, before);
    }

    #[test]
    fn save_then_load_reproduces_outputs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.bin");
        let trained = {
            let mut n = small_net(20);
            n.backward_and_step(&sample_input(), 2, 3.0, 0.05).unwrap();
            n
        };
        trained.save(&path).unwrap();

        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, (HEADER_BYTES + 4 * trained.param_count()) as u64);

        let mut fresh = small_net(21);
        fresh.load(&path).unwrap();
        assert_eq!(fresh.predict(&sample_input()).unwrap(), trained.predict(&sample_input()).unwrap());
        assert_eq!(fresh, trained);

        let rebuilt = NeuralNet::from_file(&path).unwrap();
        assert_eq!(rebuilt.shape(), trained.shape());
        assert_eq!(rebuilt, trained);
    }

    #[test]
    fn header_layout_is_little_endian() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");
        small_net(1).save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], &[0x31, 0x50, 0x4C, 0x4D]);
        assert_eq!(&bytes[4..8], &1i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &6i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &8i32.to_le_bytes());
        assert_eq!(&bytes[16..20], &5i32.to_le_bytes());
        assert_eq!(&bytes[20..24], &3i32.to_le_bytes());
    }

    #[test]
    fn load_rejects_bad_magic_version_and_truncation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");
        let net = small_net(1);
        net.save(&path).unwrap();
        let good = std::fs::read(&path).unwrap();

        let mut target = small_net(2);
        let before = target.clone();

        let mut bad_magic = good.clone();
        bad_magic[0] ^= 0xFF;
        std::fs::write(&path, &bad_magic).unwrap();
        assert!(matches!(target.load(&path), Err(Error::Format(_))));

        let mut bad_version = good.clone();
        bad_version[4..8].copy_from_slice(&2i32.to_le_bytes());
        std::fs::write(&path, &bad_version).unwrap();
        assert!(matches!(target.load(&path), Err(Error::Format(_))));

        std::fs::write(&path, &good[..good.len() - 3]).unwrap();
        assert!(matches!(target.load(&path), Err(Error::Format(_))));

        std::fs::write(&path, &good[..10]).unwrap();
        assert!(matches!(target.load(&path), Err(Error::Format(_))));

        assert_eq!(target, before);
    }

    #[test]
    fn load_rejects_other_architecture() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");
        NeuralNet::new(6, 8, 5, 4, &mut StdRng::seed_from_u64(1)).save(&path).unwrap();
        let mut net = small_net(2);
        let before = net.clone();
        match net.load(&path) {
            Err(Error::ArchitectureMismatch { expected, found }) => {
                assert_eq!(expected, Shape::new(6, 8, 5, 3));
                assert_eq!(found, Shape::new(6, 8, 5, 4));
            }
            other => panic!("expected architecture mismatch, got {other:?}"),
        }
        assert_eq!(net, before);
    }

    fn header_only(dims: [i32; 4]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in [FILE_MAGIC, FORMAT_VERSION].into_iter().chain(dims) {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn from_file_rejects_oversized_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.bin");

        // payload size overflows u64
        std::fs::write(&path, header_only([i32::MAX; 4])).unwrap();
        assert!(matches!(NeuralNet::from_file(&path), Err(Error::Format(_))));

        // representable, but far larger than the file
        let mut bytes = header_only([1000, 1000, 1000, 1000]);
        bytes.extend_from_slice(&[0u8; 64]);
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(NeuralNet::from_file(&path), Err(Error::Format(_))));

        std::fs::write(&path, header_only([0, 8, 5, 3])).unwrap();
        assert!(matches!(NeuralNet::from_file(&path), Err(Error::Format(_))));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let mut net = small_net(1);
        assert!(matches!(net.load(dir.path().join("nope.bin")), Err(Error::Io(_))));
    }
}
