pub mod beacon_state;
