use chrono::NaiveTime;
use serde::Serialize;

use super::expand::{expand_schedule, format_schedule_display, ScheduleExpansion};
use super::frequency::resolve_dose_count;

/// Where the reminder-time picker currently is. Exactly one picker can
/// be open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "slot", rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    /// Choosing which dose of the day to set a time for.
    PickingDose,
    /// Time picker open for the given slot.
    PickingTime(usize),
    Complete,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("Cannot {action} while {from:?}")]
    InvalidTransition { from: FlowState, action: &'static str },
    #[error("Dose slot {slot} out of range (dose count {dose_count})")]
    SlotOutOfRange { slot: usize, dose_count: u32 },
}

/// Reminder-time selection for the add-medicine form.
#[derive(Debug, Clone)]
pub struct TimeSlotFlow {
    state: FlowState,
    dose_count: u32,
    times: Vec<Option<NaiveTime>>,
}

impl TimeSlotFlow {
    pub fn new(frequency: &str) -> Self {
        let dose_count = resolve_dose_count(frequency);
        Self {
            state: FlowState::Idle,
            dose_count,
            times: vec![None; dose_count as usize],
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn dose_count(&self) -> u32 {
        self.dose_count
    }

    pub fn times(&self) -> &[Option<NaiveTime>] {
        &self.times
    }

    /// Open the picker. Single-dose schedules go straight to the time
    /// picker for slot 0.
    pub fn start(&mut self) -> Result<(), FlowError> {
        match self.state {
            FlowState::Idle | FlowState::Complete => {
                self.state = if self.dose_count == 1 {
                    FlowState::PickingTime(0)
                } else {
                    FlowState::PickingDose
                };
                Ok(())
            }
            from => Err(FlowError::InvalidTransition { from, action: "start" }),
        }
    }

    pub fn choose_slot(&mut self, slot: usize) -> Result<(), FlowError> {
        if self.state != FlowState::PickingDose {
            return Err(FlowError::InvalidTransition {
                from: self.state,
                action: "choose a dose",
            });
        }
        if slot >= self.dose_count as usize {
            return Err(FlowError::SlotOutOfRange {
                slot,
                dose_count: self.dose_count,
            });
        }
        self.state = FlowState::PickingTime(slot);
        Ok(())
    }

    /// Assign `time` to the open slot. Returns to the dose list until
    /// every slot is filled.
    pub fn set_time(&mut self, time: NaiveTime) -> Result<(), FlowError> {
        let FlowState::PickingTime(slot) = self.state else {
            return Err(FlowError::InvalidTransition {
                from: self.state,
                action: "set a time",
            });
        };
        self.times[slot] = Some(time);
        self.state = self.settled_state();
        Ok(())
    }

    /// Close whichever picker is open without changing any time.
    pub fn cancel(&mut self) {
        self.state = match self.state {
            FlowState::PickingTime(_) if self.dose_count > 1 && !self.all_set() => {
                FlowState::PickingDose
            }
            _ if self.all_set() => FlowState::Complete,
            _ => FlowState::Idle,
        };
    }

    /// The frequency changed: resize the slots and close any picker.
    /// Times already chosen for surviving slots are kept.
    pub fn set_frequency(&mut self, frequency: &str) {
        self.dose_count = resolve_dose_count(frequency);
        self.times.resize(self.dose_count as usize, None);
        self.state = if self.all_set() {
            FlowState::Complete
        } else {
            FlowState::Idle
        };
    }

    pub fn expansion(&self) -> ScheduleExpansion {
        expand_schedule(self.dose_count, &self.times)
    }

    pub fn progress(&self) -> String {
        self.expansion().progress_label()
    }

    pub fn display(&self) -> String {
        format_schedule_display(&self.times)
    }

    fn all_set(&self) -> bool {
        self.times.iter().all(Option::is_some)
    }

    fn settled_state(&self) -> FlowState {
        if self.all_set() {
            FlowState::Complete
        } else {
            FlowState::PickingDose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn single_dose_opens_time_picker_directly() {
        let mut flow = TimeSlotFlow::new("Once daily");
        flow.start().unwrap();
        assert_eq!(flow.state(), FlowState::PickingTime(0));
        flow.set_time(t(8)).unwrap();
        assert_eq!(flow.state(), FlowState::Complete);
        assert_eq!(flow.display(), "8:00 AM");
    }

    #[test]
    fn multi_dose_walks_through_slots() {
        let mut flow = TimeSlotFlow::new("Three times daily");
        flow.start().unwrap();
        assert_eq!(flow.state(), FlowState::PickingDose);

        flow.choose_slot(0).unwrap();
        flow.set_time(t(8)).unwrap();
        assert_eq!(flow.state(), FlowState::PickingDose);
        assert_eq!(flow.progress(), "1/3 scheduled");

        flow.choose_slot(2).unwrap();
        flow.set_time(t(20)).unwrap();
        assert_eq!(flow.progress(), "2/3 scheduled");
        assert!(!flow.expansion().is_complete());

        flow.choose_slot(1).unwrap();
        flow.set_time(t(14)).unwrap();
        assert_eq!(flow.state(), FlowState::Complete);
        assert_eq!(flow.progress(), "3/3 scheduled");
    }

    #[test]
    fn cannot_open_two_pickers() {
        let mut flow = TimeSlotFlow::new("Twice daily");
        flow.start().unwrap();
        flow.choose_slot(0).unwrap();
        let err = flow.choose_slot(1).unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition { .. }));
        assert!(flow.start().is_err());
    }

    #[test]
    fn slot_out_of_range_rejected() {
        let mut flow = TimeSlotFlow::new("Twice daily");
        flow.start().unwrap();
        assert_eq!(
            flow.choose_slot(2).unwrap_err(),
            FlowError::SlotOutOfRange { slot: 2, dose_count: 2 }
        );
    }

    #[test]
    fn oversized_frequency_keeps_slots_bounded() {
        let mut flow = TimeSlotFlow::new("4000000000 times daily");
        assert_eq!(flow.dose_count(), 1);
        assert_eq!(flow.times().len(), 1);

        flow.set_frequency("24 times daily");
        assert_eq!(flow.times().len(), 24);
        flow.set_frequency("100 times daily");
        assert_eq!(flow.times().len(), 1);
    }

    #[test]
    fn set_time_requires_open_picker() {
        let mut flow = TimeSlotFlow::new("Twice daily");
        assert!(flow.set_time(t(8)).is_err());
    }

    #[test]
    fn cancel_returns_to_dose_list() {
        let mut flow = TimeSlotFlow::new("Twice daily");
        flow.start().unwrap();
        flow.choose_slot(1).unwrap();
        flow.cancel();
        assert_eq!(flow.state(), FlowState::PickingDose);
        flow.cancel();
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[test]
    fn changing_frequency_keeps_surviving_times() {
        let mut flow = TimeSlotFlow::new("Twice daily");
        flow.start().unwrap();
        flow.choose_slot(0).unwrap();
        flow.set_time(t(8)).unwrap();
        flow.choose_slot(1).unwrap();
        flow.set_time(t(20)).unwrap();

        flow.set_frequency("Once daily");
        assert_eq!(flow.dose_count(), 1);
        assert_eq!(flow.times(), &[Some(t(8))]);
        assert_eq!(flow.state(), FlowState::Complete);

        flow.set_frequency("Every 8 hours");
        assert_eq!(flow.progress(), "1/3 scheduled");
        assert_eq!(flow.state(), FlowState::Idle);
    }
}
