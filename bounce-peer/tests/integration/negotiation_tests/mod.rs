mod test_data_channel_round_trip;
mod test_early_candidates_are_applied;
