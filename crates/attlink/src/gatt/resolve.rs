//! Characteristic and descriptor lookup by 16-bit UUID

use super::client::GattClient;
use crate::att::{
    AttPacket, DiscoveryMode, DiscoveryRecord, FindByTypeValueRequest, FindByTypeValueResponse,
    HandleRange, WriteRequest, CCCD_ENABLE_NOTIFICATIONS, CLIENT_CHAR_CONFIG_UUID,
    PRIMARY_SERVICE_UUID,
};
use crate::error::{Error, Result, Violation};
use crate::transport::{AttStream, NotificationFilter};
use crate::uuid::Uuid;
use log::{debug, info};
use std::ops::ControlFlow;

/// Handles involved in one notification subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    /// Handle range of the owning service
    pub service: HandleRange,
    /// Value handle the notifications arrive on
    pub value_handle: u16,
    /// Client Characteristic Configuration descriptor that was written
    pub cccd_handle: u16,
}

impl<S: AttStream> GattClient<S> {
    /// Looks up the value handle of each UUID in `uuids` within `range`.
    ///
    /// Only records carrying a 16-bit UUID are considered and each slot keeps
    /// its first match. Enumeration stops as soon as every slot is filled, so
    /// unresolved slots mean the range ran out, or the peer stopped answering.
    pub fn find_characteristics(
        &mut self,
        range: HandleRange,
        uuids: &[u16],
    ) -> Result<Vec<Option<u16>>> {
        let mut found = vec![None; uuids.len()];
        if uuids.is_empty() {
            return Ok(found);
        }

        let outcome = self.enumerate(range, DiscoveryMode::Characteristic, |record| {
            if let DiscoveryRecord::Characteristic {
                value_handle,
                uuid: Uuid::Short(value),
                ..
            } = record
            {
                for (slot, wanted) in found.iter_mut().zip(uuids) {
                    if slot.is_none() && wanted == value {
                        *slot = Some(*value_handle);
                    }
                }
            }
            if found.iter().all(Option::is_some) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;

        debug!("characteristic lookup in {} {}: {:?}", range, outcome, found);
        Ok(found)
    }

    /// Like [`find_characteristics`](Self::find_characteristics), but every
    /// UUID must resolve.
    pub fn resolve_characteristics(
        &mut self,
        range: HandleRange,
        uuids: &[u16],
    ) -> Result<Vec<u16>> {
        let found = self.find_characteristics(range, uuids)?;
        let resolved = found.iter().filter(|slot| slot.is_some()).count();
        if resolved != uuids.len() {
            return Err(Error::Incomplete {
                resolved,
                requested: uuids.len(),
            });
        }
        Ok(found.into_iter().flatten().collect())
    }

    /// Returns the handle of the first descriptor with 16-bit type `uuid` in `range`
    pub fn find_descriptor(&mut self, range: HandleRange, uuid: u16) -> Result<Option<u16>> {
        let mut found = None;
        self.enumerate(range, DiscoveryMode::Descriptor, |record| match record {
            DiscoveryRecord::Descriptor { handle, uuid: kind } if *kind == uuid => {
                found = Some(*handle);
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        })?;
        Ok(found)
    }

    /// Enables notifications for the characteristic at `value_handle`.
    ///
    /// The CCCD is searched for between the value handle and `group_end`,
    /// then written with the enable bit. Whatever comes back, if anything,
    /// is taken as the Write Response. Returns the CCCD handle.
    pub fn subscribe_notifications(&mut self, value_handle: u16, group_end: u16) -> Result<u16> {
        let range = HandleRange::new(value_handle, group_end)
            .and_then(|group| group.after(value_handle))
            .ok_or(Error::DescriptorNotFound)?;
        let cccd = self
            .find_descriptor(range, CLIENT_CHAR_CONFIG_UUID)?
            .ok_or(Error::DescriptorNotFound)?;

        let request = WriteRequest {
            handle: cccd,
            value: CCCD_ENABLE_NOTIFICATIONS.to_vec(),
        };
        self.channel.request(&request.serialize())?;
        debug!("notifications enabled through CCCD 0x{:04x}", cccd);
        Ok(cccd)
    }

    /// Finds the handle range of the primary service `service_uuid`.
    ///
    /// Exactly one group is expected, so the reply must be the five byte
    /// `07 ss ss ee ee`. Any other opcode or group count is malformed.
    pub fn get_service_range(&mut self, service_uuid: u16) -> Result<HandleRange> {
        let request = FindByTypeValueRequest {
            range: HandleRange::full(),
            attribute_type: PRIMARY_SERVICE_UUID,
            value: service_uuid.to_le_bytes().to_vec(),
        };
        self.channel.send(&request.serialize())?;
        let response = self.channel.receive_pdu()?;

        if response.first() != Some(&FindByTypeValueResponse::opcode()) {
            return Err(Violation::MalformedServiceRange.into());
        }
        match FindByTypeValueResponse::parse(&response)?.groups.as_slice() {
            [group] => Ok(*group),
            _ => Err(Violation::MalformedServiceRange.into()),
        }
    }

    /// Prepares the channel to receive notifications of one characteristic.
    ///
    /// Notifications are discarded while the service is searched, then
    /// limited to the characteristic's value handle once it is subscribed.
    pub fn subscribe_characteristic(
        &mut self,
        service_uuid: u16,
        characteristic_uuid: u16,
    ) -> Result<Subscription> {
        self.channel.set_filter(NotificationFilter::DiscardAll);

        let service = self.get_service_range(service_uuid)?;
        let value_handle = self.resolve_characteristics(service, &[characteristic_uuid])?[0];
        if self.channel.verbosity() >= 1 {
            info!(
                "service 0x{:04x} at {}, characteristic 0x{:04x} at 0x{:04x}",
                service_uuid, service, characteristic_uuid, value_handle
            );
        }

        let cccd_handle = self.subscribe_notifications(value_handle, service.end())?;
        self.channel.set_filter(NotificationFilter::Only(value_handle));

        Ok(Subscription {
            service,
            value_handle,
            cccd_handle,
        })
    }
}
