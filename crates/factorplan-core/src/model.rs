//! Ground-model contracts (§6) consumed by the solver and learning crates.
//! These traits describe what a caller's environment must expose; they do
//! not prescribe how the environment stores its tensors.

/// A Markov Decision Process. Either the dense tensor accessors
/// (`transition_probability`/`expected_reward`) or `sample_sr` (or both) may
/// be used by a given solver — planning algorithms want the former, learning
/// algorithms the latter.
pub trait Mdp {
    fn state_count(&self) -> usize;
    fn action_count(&self) -> usize;
    fn discount(&self) -> f64;
    fn is_terminal(&self, state: usize) -> bool;

    fn transition_probability(&self, state: usize, action: usize, next_state: usize) -> f64;
    fn expected_reward(&self, state: usize, action: usize, next_state: usize) -> f64;

    /// Samples a transition under `rng` without requiring the caller to
    /// construct the dense tensors. Default implementation rejection-samples
    /// from `transition_probability`; implementors with a native simulator
    /// should override this for efficiency.
    fn sample_sr(&self, state: usize, action: usize, rng: &mut impl rand::RngCore) -> (usize, f64) {
        use rand::Rng;
        let draw: f64 = rng.random();
        let mut cumulative = 0.0;
        for next_state in 0..self.state_count() {
            cumulative += self.transition_probability(state, action, next_state);
            if draw <= cumulative {
                return (next_state, self.expected_reward(state, action, next_state));
            }
        }
        let last = self.state_count().saturating_sub(1);
        (last, self.expected_reward(state, action, last))
    }
}

/// A partially observable MDP: extends [`Mdp`] with an observation channel.
pub trait Pomdp: Mdp {
    fn observation_count(&self) -> usize;
    fn observation_probability(&self, next_state: usize, action: usize, observation: usize) -> f64;

    fn sample_sor(
        &self,
        state: usize,
        action: usize,
        rng: &mut impl rand::RngCore,
    ) -> (usize, usize, f64) {
        let (next_state, reward) = self.sample_sr(state, action, rng);
        use rand::Rng;
        let draw: f64 = rng.random();
        let mut cumulative = 0.0;
        for observation in 0..self.observation_count() {
            cumulative += self.observation_probability(next_state, action, observation);
            if draw <= cumulative {
                return (next_state, observation, reward);
            }
        }
        (next_state, self.observation_count().saturating_sub(1), reward)
    }
}

/// A factored, multi-agent cooperative model: state and action spaces are
/// products of small per-variable domains, the transition model factors as
/// a dynamic Bayesian network, and reward decomposes as a sum of local
/// basis functions. `factorplan-learn` and `factorplan-solve` consume this
/// contract instead of [`Mdp`]'s dense tensors.
pub trait FactoredModel {
    /// Domain size of each state variable, in a fixed order.
    fn state_sizes(&self) -> &[usize];
    /// Domain size of each agent's local action, in a fixed order.
    fn action_sizes(&self) -> &[usize];

    /// The scope (state-variable indices) and action-scope (agent indices)
    /// each basis function of the factored reward depends on, plus its
    /// table, indexed by the flattened local (state, action) assignment.
    fn reward_basis(&self) -> &[RewardBasis];

    /// The DBN conditional table for one next-state variable: the scope of
    /// parent state/action variables it depends on, plus a table mapping a
    /// flattened parent assignment to a distribution over that variable's
    /// next value.
    fn transition_basis(&self, next_variable: usize) -> &TransitionBasis;
}

/// One additive term of a factored reward function.
pub struct RewardBasis {
    pub state_scope: Vec<usize>,
    pub action_scope: Vec<usize>,
    pub table: Vec<f64>,
}

/// One DBN conditional-probability table for a single next-state variable.
pub struct TransitionBasis {
    pub state_scope: Vec<usize>,
    pub action_scope: Vec<usize>,
    pub domain_size: usize,
    /// `table[flat_parent_index * domain_size + next_value]`.
    pub table: Vec<f64>,
}

impl TransitionBasis {
    pub fn probability(&self, flat_parent_index: usize, next_value: usize) -> f64 {
        self.table[flat_parent_index * self.domain_size + next_value]
    }
}
