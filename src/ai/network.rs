use burn::nn::{Linear, LinearConfig, Lstm, LstmConfig, LstmState, Relu};
use burn::prelude::*;

/// Recurrent hidden state carried across the plies of one episode.
/// Fresh zero state per agent per game; never shared between agents.
pub type RecurrentState<B> = LstmState<B, 2>;

/// Zero-initialized recurrent state for the start of an episode.
pub fn init_recurrent_state<B: Backend>(
    hidden_size: usize,
    device: &B::Device,
) -> RecurrentState<B> {
    LstmState::new(
        Tensor::zeros([1, hidden_size], device),
        Tensor::zeros([1, hidden_size], device),
    )
}

/// Combined policy-value network with a recurrent trunk.
///
/// Processes one observation per call and threads the LSTM state through
/// the episode:
/// ```text
/// Input:   [1, n_inputs]  (both sides' holes and stores)
/// FC_in:   n_inputs -> neuron_size, ReLU
/// LSTM:    neuron_size -> hidden_size  (single step, carried state)
/// Policy head: hidden_size -> n_outputs  (logits, one per hole)
/// Value head:  hidden_size -> 1          (state value estimate)
/// ```
#[derive(Module, Debug)]
pub struct RecurrentPolicyValue<B: Backend> {
    fc_in: Linear<B>,
    lstm: Lstm<B>,
    policy_head: Linear<B>,
    value_head: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct RecurrentPolicyValueConfig {
    pub n_inputs: usize,
    pub n_outputs: usize,
    pub hidden_size: usize,
    pub neuron_size: usize,
}

impl RecurrentPolicyValueConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> RecurrentPolicyValue<B> {
        RecurrentPolicyValue {
            fc_in: LinearConfig::new(self.n_inputs, self.neuron_size).init(device),
            lstm: LstmConfig::new(self.neuron_size, self.hidden_size, true).init(device),
            policy_head: LinearConfig::new(self.hidden_size, self.n_outputs).init(device),
            value_head: LinearConfig::new(self.hidden_size, 1).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> RecurrentPolicyValue<B> {
    /// One recurrent step: observation [1, n_inputs] and incoming state ->
    /// (logits [1, n_outputs], value [1, 1], outgoing state).
    pub fn forward(
        &self,
        input: Tensor<B, 2>,
        state: Option<RecurrentState<B>>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>, RecurrentState<B>) {
        let x = self.relu.forward(self.fc_in.forward(input));
        // The LSTM consumes [batch, seq, features]; each ply is a
        // single-step sequence
        let (out, next_state) = self.lstm.forward(x.unsqueeze_dim::<3>(1), state);
        let x = out.squeeze::<2>(1);

        let logits = self.policy_head.forward(x.clone());
        let value = self.value_head.forward(x);

        (logits, value, next_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn test_config() -> RecurrentPolicyValueConfig {
        RecurrentPolicyValueConfig::new(16, 7, 32, 24)
    }

    #[test]
    fn test_network_output_shapes() {
        let device = Default::default();
        let network = test_config().init::<TestBackend>(&device);

        let input = Tensor::zeros([1, 16], &device);
        let (logits, value, _state) = network.forward(input, None);
        assert_eq!(logits.shape().dims, [1, 7]);
        assert_eq!(value.shape().dims, [1, 1]);
    }

    #[test]
    fn test_state_threads_through_steps() {
        let device = Default::default();
        let network = test_config().init::<TestBackend>(&device);

        let state = init_recurrent_state::<TestBackend>(32, &device);
        let input = Tensor::ones([1, 16], &device);
        let (_, _, state) = network.forward(input.clone(), Some(state));
        assert_eq!(state.hidden.shape().dims, [1, 32]);
        assert_eq!(state.cell.shape().dims, [1, 32]);

        let (logits, value, _) = network.forward(input, Some(state));
        assert_eq!(logits.shape().dims, [1, 7]);
        assert_eq!(value.shape().dims, [1, 1]);
    }

    #[test]
    fn test_zero_state_matches_no_state() {
        let device = Default::default();
        let network = test_config().init::<TestBackend>(&device);
        let input = Tensor::ones([1, 16], &device);

        let zeros = init_recurrent_state::<TestBackend>(32, &device);
        let (with_zeros, _, _) = network.forward(input.clone(), Some(zeros));
        let (without, _, _) = network.forward(input, None);

        let a = with_zeros.into_data().to_vec::<f32>().unwrap();
        let b = without.into_data().to_vec::<f32>().unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}
