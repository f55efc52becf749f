use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;

use crate::ai::error::NetworkError;

/// Upper bound of the uniform distribution used for initial weights.
const INITIAL_WEIGHT_SCALE: f64 = 0.1;

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Derivative of [`sigmoid`] expressed through its output: `y` must already be
/// an activation, not the pre-activation input.
pub fn sigmoid_derivative(y: f64) -> f64 {
    y * (1.0 - y)
}

struct Activations {
    hidden: Array2<f64>,
    output: Array2<f64>,
}

/// Two-layer perceptron with sigmoid activations and no biases:
/// `hidden = sigmoid(input · W1)`, `output = sigmoid(hidden · W2)`.
///
/// Inputs and outputs are single rows. The weights are owned by the network and
/// only change through [`ValueNetwork::update`].
#[derive(Clone, Debug)]
pub struct ValueNetwork {
    input_hidden: Array2<f64>,
    hidden_output: Array2<f64>,
}

impl ValueNetwork {
    /// Creates a network with weights drawn uniformly from `[0, 0.1)`.
    pub fn new<R: Rng>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        rng: &mut R,
    ) -> Self {
        let input_hidden = Array2::from_shape_fn((input_size, hidden_size), |_| {
            INITIAL_WEIGHT_SCALE * rng.gen::<f64>()
        });
        let hidden_output = Array2::from_shape_fn((hidden_size, output_size), |_| {
            INITIAL_WEIGHT_SCALE * rng.gen::<f64>()
        });
        Self {
            input_hidden,
            hidden_output,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_hidden.nrows()
    }

    pub fn hidden_size(&self) -> usize {
        self.input_hidden.ncols()
    }

    pub fn output_size(&self) -> usize {
        self.hidden_output.ncols()
    }

    /// Evaluates the network. `input` must have exactly [`Self::input_size`] elements.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>, NetworkError> {
        let input = self.as_row(input)?;
        let Activations { output, .. } = self.forward(input);
        if output.len() != self.output_size() {
            return Err(NetworkError::output_size_mismatch(
                self.output_size(),
                output.len(),
            ));
        }
        Ok(output.iter().copied().collect())
    }

    /// Performs one backpropagation step towards `target` and returns the squared
    /// error of the prediction made before the step.
    ///
    /// Both deltas are computed from the weights as they were before the call.
    pub fn update(
        &mut self,
        input: &[f64],
        target: &[f64],
        learning_rate: f64,
    ) -> Result<f64, NetworkError> {
        if target.len() != self.output_size() {
            return Err(NetworkError::target_size_mismatch(
                self.output_size(),
                target.len(),
            ));
        }
        let input = self.as_row(input)?;
        let target = ArrayView1::from(target).insert_axis(Axis(0));
        let Activations { hidden, output } = self.forward(input);

        let output_error = &target - &output;
        let output_delta = &output_error * &output.mapv(sigmoid_derivative);
        let hidden_error = output_delta.dot(&self.hidden_output.t());
        let hidden_delta = &hidden_error * &hidden.mapv(sigmoid_derivative);

        let hidden_output_step = hidden.t().dot(&output_delta);
        let input_hidden_step = input.t().dot(&hidden_delta);
        self.hidden_output
            .scaled_add(learning_rate, &hidden_output_step);
        self.input_hidden.scaled_add(learning_rate, &input_hidden_step);

        Ok(output_error.iter().map(|e| e * e).sum())
    }

    fn as_row<'a>(&self, input: &'a [f64]) -> Result<ArrayView2<'a, f64>, NetworkError> {
        if input.len() != self.input_size() {
            return Err(NetworkError::input_size_mismatch(
                self.input_size(),
                input.len(),
            ));
        }
        Ok(ArrayView1::from(input).insert_axis(Axis(0)))
    }

    fn forward(&self, input: ArrayView2<f64>) -> Activations {
        let hidden = input.dot(&self.input_hidden).mapv(sigmoid);
        let output = hidden.dot(&self.hidden_output).mapv(sigmoid);
        Activations { hidden, output }
    }
}

#[cfg(test)]
mod test {
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn create_network(input: usize, hidden: usize, output: usize) -> ValueNetwork {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        ValueNetwork::new(input, hidden, output, &mut rng)
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(1.0) - 0.7310586).abs() < 1e-6);

        let values: Vec<f64> = (-40..=40).map(|z| sigmoid(z as f64 * 0.5)).collect();
        for pair in values.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(values.iter().all(|y| *y > 0.0 && *y < 1.0));
    }

    #[test]
    fn test_sigmoid_derivative() {
        assert_eq!(sigmoid_derivative(0.5), 0.25);
        assert!((sigmoid_derivative(0.8) - 0.16).abs() < 1e-12);
        for y in [0.01, 0.2, 0.4, 0.6, 0.99] {
            assert!(sigmoid_derivative(y) < 0.25);
        }
        assert!(sigmoid_derivative(1e-9) < 1e-8);
        assert!(sigmoid_derivative(1.0 - 1e-9) < 1e-8);
    }

    #[test]
    fn test_initial_weights() {
        let network = create_network(18, 5, 1);
        assert_eq!(network.input_hidden.dim(), (18, 5));
        assert_eq!(network.hidden_output.dim(), (5, 1));
        assert!(network
            .input_hidden
            .iter()
            .chain(network.hidden_output.iter())
            .all(|w| (0.0..INITIAL_WEIGHT_SCALE).contains(w)));
    }

    #[test]
    fn test_predict_shape() {
        let network = create_network(3, 4, 2);
        let output = network.predict(&[0.5, -0.2, 0.1]).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|y| *y > 0.0 && *y < 1.0));
    }

    #[test]
    fn test_size_mismatch() {
        let mut network = create_network(3, 4, 1);
        assert_eq!(
            network.predict(&[1.0, 0.0]).unwrap_err(),
            NetworkError::input_size_mismatch(3, 2)
        );
        assert_eq!(
            network.update(&[1.0, 0.0, 0.0, 1.0], &[0.5], 0.1).unwrap_err(),
            NetworkError::input_size_mismatch(3, 4)
        );
        assert_eq!(
            network.update(&[1.0, 0.0, 0.0], &[0.5, 0.5], 0.1).unwrap_err(),
            NetworkError::target_size_mismatch(1, 2)
        );
    }

    #[test]
    fn test_update_uses_pre_update_weights() {
        let mut network = ValueNetwork {
            input_hidden: array![[0.0]],
            hidden_output: array![[0.0]],
        };
        // hidden = output = 0.5, output delta = 0.5 * 0.25
        let squared_error = network.update(&[1.0], &[1.0], 1.0).unwrap();
        assert_eq!(squared_error, 0.25);
        assert_eq!(network.hidden_output, array![[0.0625]]);
        // the hidden error is taken through the old zero weight
        assert_eq!(network.input_hidden, array![[0.0]]);
    }

    #[test]
    fn test_update_converges() {
        let mut network = create_network(3, 4, 1);
        let input = [0.5, -0.2, 0.1];
        let target = [0.8];

        let initial_error = (network.predict(&input).unwrap()[0] - target[0]).abs();
        let mut previous_error = initial_error;
        for _ in 0..5000 {
            network.update(&input, &target, 0.1).unwrap();
            let error = (network.predict(&input).unwrap()[0] - target[0]).abs();
            assert!(error <= previous_error + 1e-12);
            previous_error = error;
        }
        assert!(previous_error.is_finite());
        assert!(previous_error < initial_error);
        assert!(previous_error < 0.05);
    }
}
